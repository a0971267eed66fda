//! Wire messages for `courier.v1` and the tonic service stubs generated
//! from them by `build.rs`.
//!
//! Field tags are part of the wire contract; never renumber them.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Greeting {
    #[prost(string, tag = "1")]
    pub first_name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub last_name: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GreetRequest {
    #[prost(message, optional, tag = "1")]
    pub greeting: ::core::option::Option<Greeting>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GreetResponse {
    #[prost(string, tag = "1")]
    pub text: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SumRequest {
    #[prost(int64, tag = "1")]
    pub a: i64,
    #[prost(int64, tag = "2")]
    pub b: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SumResponse {
    #[prost(int64, tag = "1")]
    pub sum: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FactorRequest {
    #[prost(int64, tag = "1")]
    pub number: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FactorResponse {
    #[prost(int64, tag = "1")]
    pub prime_factor: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NumberRequest {
    #[prost(int64, tag = "1")]
    pub number: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AverageResponse {
    #[prost(double, tag = "1")]
    pub average: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SquareRootRequest {
    #[prost(int32, tag = "1")]
    pub number: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SquareRootResponse {
    #[prost(double, tag = "1")]
    pub root: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Blog {
    /// Empty until assigned by the store.
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub author_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub title: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub body: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub image_path: ::prost::alloc::string::String,
}

/// One item of a `CreateBlog` upload: metadata first, then image chunks.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateBlogRequest {
    #[prost(oneof = "create_blog_request::Data", tags = "1, 2")]
    pub data: ::core::option::Option<create_blog_request::Data>,
}

pub mod create_blog_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Data {
        #[prost(message, tag = "1")]
        Blog(super::Blog),
        #[prost(bytes = "vec", tag = "2")]
        Image(::prost::alloc::vec::Vec<u8>),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlogResponse {
    #[prost(message, optional, tag = "1")]
    pub blog: ::core::option::Option<Blog>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadBlogRequest {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}

/// Full replacement of a post. A non-empty `image` replaces the cover too.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateBlogRequest {
    #[prost(message, optional, tag = "1")]
    pub blog: ::core::option::Option<Blog>,
    #[prost(bytes = "vec", tag = "2")]
    pub image: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteBlogRequest {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteBlogResponse {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListBlogRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListBlogResponse {
    #[prost(message, repeated, tag = "1")]
    pub blogs: ::prost::alloc::vec::Vec<Blog>,
}

include!(concat!(env!("OUT_DIR"), "/courier.v1.GreetService.rs"));
include!(concat!(env!("OUT_DIR"), "/courier.v1.BlogService.rs"));
