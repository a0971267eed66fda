use courier::{CourierError, ErrorKind, Result};

#[test]
fn test_error_display() {
    let err = CourierError::NotFound {
        collection: "blog".to_string(),
        id: "5f2b0a0c1d3e4f5a6b7c8d9e".to_string(),
    };
    assert!(err.to_string().contains("5f2b0a0c1d3e4f5a6b7c8d9e"));
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(CourierError::Cancelled)
    }
    assert!(returns_error().is_err());
}

// ============================================================================
// Kind classification
// ============================================================================

#[test]
fn caller_input_errors_are_invalid_argument() {
    for err in [
        CourierError::InvalidArgument("received a negative number: -1".into()),
        CourierError::MalformedId("xyz".into()),
        CourierError::UploadProtocol("first item must carry blog metadata".into()),
    ] {
        assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{err}");
    }
}

#[test]
fn cancellation_is_deadline_exceeded() {
    assert_eq!(
        CourierError::DeadlineExceeded("late".into()).kind(),
        ErrorKind::DeadlineExceeded
    );
    assert_eq!(CourierError::Cancelled.kind(), ErrorKind::DeadlineExceeded);
}

#[test]
fn backend_errors_are_internal() {
    assert_eq!(CourierError::Store("down".into()).kind(), ErrorKind::Internal);
    assert_eq!(
        CourierError::Configuration("bad".into()).kind(),
        ErrorKind::Internal
    );
    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert_eq!(CourierError::from(json).kind(), ErrorKind::Internal);
}

#[test]
fn stream_failures_are_unknown() {
    assert_eq!(
        CourierError::Stream("reset".into()).kind(),
        ErrorKind::Unknown
    );
    assert_eq!(
        CourierError::Transport("refused".into()).kind(),
        ErrorKind::Unknown
    );
}

// ============================================================================
// Status mapping
// ============================================================================

#[test]
fn every_kind_maps_to_its_status_code() {
    let cases = [
        (CourierError::InvalidArgument("x".into()), tonic::Code::InvalidArgument),
        (
            CourierError::NotFound {
                collection: "blog".into(),
                id: "x".into(),
            },
            tonic::Code::NotFound,
        ),
        (CourierError::Cancelled, tonic::Code::DeadlineExceeded),
        (
            CourierError::UploadTooLarge {
                limit: 1,
                received: 2,
            },
            tonic::Code::ResourceExhausted,
        ),
        (CourierError::Store("x".into()), tonic::Code::Internal),
        (CourierError::Stream("x".into()), tonic::Code::Unknown),
    ];
    for (err, code) in cases {
        let status = tonic::Status::from(err);
        assert_eq!(status.code(), code);
    }
}

#[test]
fn client_side_cancellation_reads_as_deadline_exceeded() {
    let err = CourierError::from(tonic::Status::cancelled("Timeout expired"));
    assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
}

#[test]
fn error_kind_labels() {
    assert_eq!(ErrorKind::ResourceExhausted.as_str(), "resource_exhausted");
    assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
}
