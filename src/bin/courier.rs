//! courier — Courier CLI client
//!
//! One subcommand per RPC of courierd.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use futures_util::{StreamExt, stream};

use courier::client::{CourierClient, client_tls};
use courier::{BlogDraft, BlogRecord, Greeting};

/// Courier CLI client
#[derive(Parser)]
#[command(name = "courier")]
#[command(version = courier::PKG_VERSION, long_version = courier::version_string())]
#[command(about = "Courier gRPC client")]
struct Args {
    /// Server address
    #[arg(
        short,
        long,
        env = "COURIER_ADDRESS",
        default_value = "http://127.0.0.1:50051"
    )]
    address: String,

    /// CA certificate (PEM) to verify the server with; enables TLS
    #[arg(long)]
    ca_cert: Option<PathBuf>,

    /// Server name to verify, when it differs from the address host
    #[arg(long, requires = "ca_cert")]
    domain: Option<String>,

    /// Call deadline in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Greet a person
    Greet { first: String, last: String },

    /// Add two integers (the server takes a few seconds)
    Sum { a: i64, b: i64 },

    /// Receive a stream of greetings
    GreetStream { first: String, last: String },

    /// Stream the prime factors of a number
    Factor { number: i64 },

    /// Send several first names as one streamed greeting
    LongGreet {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Average a stream of integers
    Average {
        #[arg(required = true, allow_negative_numbers = true)]
        numbers: Vec<i64>,
    },

    /// Exchange greetings in both directions
    GreetEveryone {
        #[arg(required = true)]
        names: Vec<String>,
        /// Pause between sent greetings in milliseconds
        #[arg(long, default_value_t = 0)]
        pace_ms: u64,
    },

    /// Square root of an integer
    SquareRoot {
        #[arg(allow_negative_numbers = true)]
        number: i32,
    },

    /// Create a blog post with a cover image
    CreateBlog {
        #[arg(long)]
        author: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        /// Logical image path stored with the post
        #[arg(long)]
        image_path: String,
        /// Local file to upload as the cover
        image: PathBuf,
    },

    /// Read a blog post
    ReadBlog { id: String },

    /// Replace a blog post
    UpdateBlog {
        id: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        image_path: String,
        /// Local file replacing the cover
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Delete a blog post
    DeleteBlog { id: String },

    /// List all blog posts
    ListBlog,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let tls = match &args.ca_cert {
        Some(ca_cert) => Some(client_tls(ca_cert, args.domain.as_deref()).await?),
        None => None,
    };
    let mut client = CourierClient::connect_with_tls(&args.address, tls).await?;
    if let Some(ms) = args.timeout_ms {
        client = client.with_timeout(Duration::from_millis(ms));
    }

    match args.command {
        Command::Greet { first, last } => {
            println!("{}", client.greet(Greeting::new(first, last)).await?);
        }
        Command::Sum { a, b } => {
            println!("{}", client.sum(a, b).await?);
        }
        Command::GreetStream { first, last } => {
            let mut replies = client.greet_stream(Greeting::new(first, last)).await?;
            while let Some(reply) = replies.next().await {
                println!("{}", reply?);
            }
        }
        Command::Factor { number } => {
            let mut factors = client.factor_stream(number).await?;
            while let Some(factor) = factors.next().await {
                println!("{}", factor?);
            }
        }
        Command::LongGreet { names } => {
            let greetings = names.into_iter().map(|n| Greeting::new(n, ""));
            println!("{}", client.long_greet(stream::iter(greetings)).await?);
        }
        Command::Average { numbers } => {
            println!("{}", client.compute_average(stream::iter(numbers)).await?);
        }
        Command::GreetEveryone { names, pace_ms } => {
            let greetings = names.into_iter().map(|n| Greeting::new(n, "")).collect();
            let replies = client
                .greet_everyone(greetings, Duration::from_millis(pace_ms))
                .await?;
            for reply in replies {
                println!("{reply}");
            }
        }
        Command::SquareRoot { number } => {
            println!("{}", client.square_root(number).await?);
        }
        Command::CreateBlog {
            author,
            title,
            body,
            image_path,
            image,
        } => {
            let bytes = tokio::fs::read(&image).await?;
            let draft = BlogDraft {
                author_id: author,
                title,
                body,
                image_path,
            };
            print_blog(&client.create_blog(draft, bytes).await?);
        }
        Command::ReadBlog { id } => {
            print_blog(&client.read_blog(&id).await?);
        }
        Command::UpdateBlog {
            id,
            author,
            title,
            body,
            image_path,
            image,
        } => {
            let image = match image {
                Some(path) => Some(tokio::fs::read(path).await?),
                None => None,
            };
            let record = BlogRecord {
                id: Some(id.parse()?),
                author_id: author,
                title,
                body,
                image_path,
            };
            print_blog(&client.update_blog(record, image).await?);
        }
        Command::DeleteBlog { id } => {
            println!("deleted {}", client.delete_blog(&id).await?);
        }
        Command::ListBlog => {
            for blog in client.list_blog().await? {
                print_blog(&blog);
            }
        }
    }

    Ok(())
}

fn print_blog(blog: &BlogRecord) {
    let id = blog.id.as_ref().map_or("-", |id| id.as_str());
    println!("{id}  {}  by {}  [{}]", blog.title, blog.author_id, blog.image_path);
}
