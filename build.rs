use tonic_build::manual::{Builder, Method, Service};
use vergen_gitcl::{Build, Emitter, Gitcl};

const PROTO_MOD: &str = "crate::server::proto";
const CODEC: &str = "tonic::codec::ProstCodec";

/// Call shape of a single RPC.
#[derive(Clone, Copy)]
enum Shape {
    Unary,
    ServerStream,
    ClientStream,
    Bidi,
}

fn method(name: &str, route: &str, input: &str, output: &str, shape: Shape) -> Method {
    let builder = Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("{PROTO_MOD}::{input}"))
        .output_type(format!("{PROTO_MOD}::{output}"))
        .codec_path(CODEC);

    let builder = match shape {
        Shape::Unary => builder,
        Shape::ServerStream => builder.server_streaming(),
        Shape::ClientStream => builder.client_streaming(),
        Shape::Bidi => builder.client_streaming().server_streaming(),
    };
    builder.build()
}

fn greet_service() -> Service {
    use Shape::*;
    Service::builder()
        .name("GreetService")
        .package("courier.v1")
        .method(method("greet", "Greet", "GreetRequest", "GreetResponse", Unary))
        .method(method("sum", "Sum", "SumRequest", "SumResponse", Unary))
        .method(method(
            "greet_stream",
            "GreetStream",
            "GreetRequest",
            "GreetResponse",
            ServerStream,
        ))
        .method(method(
            "factor_stream",
            "FactorStream",
            "FactorRequest",
            "FactorResponse",
            ServerStream,
        ))
        .method(method(
            "long_greet",
            "LongGreet",
            "GreetRequest",
            "GreetResponse",
            ClientStream,
        ))
        .method(method(
            "compute_average",
            "ComputeAverage",
            "NumberRequest",
            "AverageResponse",
            ClientStream,
        ))
        .method(method(
            "greet_everyone",
            "GreetEveryone",
            "GreetRequest",
            "GreetResponse",
            Bidi,
        ))
        .method(method(
            "square_root",
            "SquareRoot",
            "SquareRootRequest",
            "SquareRootResponse",
            Unary,
        ))
        .build()
}

fn blog_service() -> Service {
    use Shape::*;
    Service::builder()
        .name("BlogService")
        .package("courier.v1")
        .method(method(
            "create_blog",
            "CreateBlog",
            "CreateBlogRequest",
            "BlogResponse",
            ClientStream,
        ))
        .method(method(
            "read_blog",
            "ReadBlog",
            "ReadBlogRequest",
            "BlogResponse",
            Unary,
        ))
        .method(method(
            "update_blog",
            "UpdateBlog",
            "UpdateBlogRequest",
            "BlogResponse",
            Unary,
        ))
        .method(method(
            "delete_blog",
            "DeleteBlog",
            "DeleteBlogRequest",
            "DeleteBlogResponse",
            Unary,
        ))
        .method(method(
            "list_blog",
            "ListBlog",
            "ListBlogRequest",
            "ListBlogResponse",
            Unary,
        ))
        .build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = Build::builder().build_timestamp(true).build();
    let gitcl = Gitcl::builder().sha(true).dirty(true).build();

    Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&gitcl)?
        .emit()?;

    // Messages are prost derives in src/server/proto.rs; only the service
    // stubs are generated, so no protoc is required.
    Builder::new()
        .build_server(true)
        .build_client(true)
        .build_transport(true)
        .compile(&[greet_service(), blog_service()]);

    Ok(())
}
