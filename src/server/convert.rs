//! Conversions between courier native types and protobuf types.
//!
//! Both directions live here: the server converts proto → native for
//! requests and native → proto for responses, the client does the reverse.

use futures_util::{Stream, StreamExt};

use crate::telemetry;
use crate::types::{BlogDraft, BlogRecord, Greeting, RecordId};
use crate::upload::UploadItem;
use crate::{CourierError, Result};

use super::proto;
use super::proto::create_blog_request::Data;

// =============================================================================
// Greetings
// =============================================================================

impl From<proto::Greeting> for Greeting {
    fn from(p: proto::Greeting) -> Self {
        Greeting {
            first_name: p.first_name,
            last_name: p.last_name,
        }
    }
}

impl From<Greeting> for proto::Greeting {
    fn from(g: Greeting) -> Self {
        proto::Greeting {
            first_name: g.first_name,
            last_name: g.last_name,
        }
    }
}

impl TryFrom<proto::GreetRequest> for Greeting {
    type Error = CourierError;

    fn try_from(p: proto::GreetRequest) -> Result<Self> {
        p.greeting
            .map(Into::into)
            .ok_or_else(|| CourierError::InvalidArgument("greeting is required".to_string()))
    }
}

impl From<Greeting> for proto::GreetRequest {
    fn from(g: Greeting) -> Self {
        proto::GreetRequest {
            greeting: Some(g.into()),
        }
    }
}

impl TryFrom<proto::NumberRequest> for i64 {
    type Error = CourierError;

    fn try_from(p: proto::NumberRequest) -> Result<Self> {
        Ok(p.number)
    }
}

// =============================================================================
// Blogs
// =============================================================================

impl TryFrom<proto::Blog> for BlogRecord {
    type Error = CourierError;

    fn try_from(p: proto::Blog) -> Result<Self> {
        let id = if p.id.is_empty() {
            None
        } else {
            Some(p.id.parse::<RecordId>()?)
        };
        Ok(BlogRecord {
            id,
            author_id: p.author_id,
            title: p.title,
            body: p.body,
            image_path: p.image_path,
        })
    }
}

impl From<BlogRecord> for proto::Blog {
    fn from(r: BlogRecord) -> Self {
        proto::Blog {
            id: r.id.map(String::from).unwrap_or_default(),
            author_id: r.author_id,
            title: r.title,
            body: r.body,
            image_path: r.image_path,
        }
    }
}

impl From<proto::Blog> for BlogDraft {
    fn from(p: proto::Blog) -> Self {
        BlogDraft {
            author_id: p.author_id,
            title: p.title,
            body: p.body,
            image_path: p.image_path,
        }
    }
}

impl From<BlogDraft> for proto::Blog {
    fn from(d: BlogDraft) -> Self {
        proto::Blog {
            id: String::new(),
            author_id: d.author_id,
            title: d.title,
            body: d.body,
            image_path: d.image_path,
        }
    }
}

impl From<BlogRecord> for proto::BlogResponse {
    fn from(r: BlogRecord) -> Self {
        proto::BlogResponse {
            blog: Some(r.into()),
        }
    }
}

// =============================================================================
// Uploads
// =============================================================================

impl TryFrom<proto::CreateBlogRequest> for UploadItem {
    type Error = CourierError;

    fn try_from(p: proto::CreateBlogRequest) -> Result<Self> {
        match p.data {
            Some(Data::Blog(blog)) => Ok(UploadItem::Metadata(blog.into())),
            Some(Data::Image(bytes)) => Ok(UploadItem::Chunk(bytes)),
            None => Err(CourierError::UploadProtocol(
                "upload item carries neither metadata nor image".to_string(),
            )),
        }
    }
}

impl From<UploadItem> for proto::CreateBlogRequest {
    fn from(item: UploadItem) -> Self {
        let data = match item {
            UploadItem::Metadata(draft) => Data::Blog(draft.into()),
            UploadItem::Chunk(bytes) => Data::Image(bytes),
        };
        proto::CreateBlogRequest { data: Some(data) }
    }
}

/// Extract the blog from a response that must carry one.
pub fn blog_from_response(response: proto::BlogResponse) -> Result<BlogRecord> {
    response
        .blog
        .ok_or_else(|| CourierError::Transport("response carried no blog".to_string()))?
        .try_into()
}

// =============================================================================
// Inbound streams
// =============================================================================

/// Classify a status raised while reading an inbound stream.
///
/// A peer that cancels or runs out its own deadline mid-stream surfaces as
/// [`CourierError::Cancelled`]; anything else is an unclassified stream failure.
pub fn inbound_error(status: tonic::Status) -> CourierError {
    match status.code() {
        tonic::Code::Cancelled | tonic::Code::DeadlineExceeded => CourierError::Cancelled,
        _ => CourierError::Stream(status.to_string()),
    }
}

/// Adapt an inbound tonic stream into native items.
pub fn inbound<S, P, T>(method: &'static str, streaming: S) -> impl Stream<Item = Result<T>> + Send
where
    S: Stream<Item = std::result::Result<P, tonic::Status>> + Send,
    P: Send,
    T: TryFrom<P, Error = CourierError>,
{
    streaming.map(move |item| {
        let message = item.map_err(inbound_error)?;
        metrics::counter!(telemetry::STREAM_ITEMS_TOTAL,
            "method" => method,
            "direction" => "inbound",
        )
        .increment(1);
        T::try_from(message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn missing_greeting_is_invalid() {
        let err = Greeting::try_from(proto::GreetRequest { greeting: None }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn blog_with_empty_id_is_unpersisted() {
        let record = BlogRecord::try_from(proto::Blog {
            id: String::new(),
            author_id: "1".into(),
            title: "t".into(),
            body: "b".into(),
            image_path: "p.jpg".into(),
        })
        .unwrap();
        assert!(record.id.is_none());
    }

    #[test]
    fn blog_with_bad_id_is_malformed() {
        let err = BlogRecord::try_from(proto::Blog {
            id: "5f20".into(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, CourierError::MalformedId(_)));
    }

    #[test]
    fn record_id_survives_wire_conversion() {
        let record = BlogRecord {
            id: Some(RecordId::generate()),
            author_id: "1001".into(),
            title: "t".into(),
            body: "b".into(),
            image_path: "p.jpg".into(),
        };
        let back = BlogRecord::try_from(proto::Blog::from(record.clone())).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn empty_upload_item_is_rejected() {
        let err = UploadItem::try_from(proto::CreateBlogRequest { data: None }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn inbound_maps_items_and_statuses() {
        let source = futures_util::stream::iter(vec![
            Ok(proto::NumberRequest { number: 3 }),
            Err(tonic::Status::cancelled("client went away")),
            Err(tonic::Status::internal("h2 protocol error")),
        ]);
        let items: Vec<Result<i64>> = inbound("ComputeAverage", source).collect().await;
        assert_eq!(items[0].as_ref().unwrap(), &3);
        assert!(matches!(items[1], Err(CourierError::Cancelled)));
        assert_eq!(items[2].as_ref().unwrap_err().kind(), ErrorKind::Unknown);
    }

    #[test]
    fn upload_items_map_to_oneof() {
        let chunk = proto::CreateBlogRequest::from(UploadItem::Chunk(vec![1, 2]));
        assert_eq!(chunk.data, Some(Data::Image(vec![1, 2])));
        assert_eq!(
            UploadItem::try_from(chunk).unwrap(),
            UploadItem::Chunk(vec![1, 2])
        );
    }
}
