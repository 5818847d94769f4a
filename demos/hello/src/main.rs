//! Hello World
//!
//! One handler answering every path with `Hello!`, composed behind the
//! default `[log, head]` chain. Requests are invoked in-process and the
//! outcome printed, so the effect of each middleware is visible:
//!
//! ```text
//! GET  /      -> 200 OK, Content-Type: text/plain, body "Hello!"
//! HEAD /      -> 200 OK, Content-Type: text/plain, no body
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package hello -- GET HEAD
//! cargo run --package hello -- --config demos/hello/frack.toml HEAD /cars
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use frack::prelude::*;
use frack::prelude::header::{CONTENT_TYPE, HeaderValue};
use tracing::info;

#[derive(Debug, Parser)]
#[command(about = "Invoke the hello pipeline in-process")]
struct Args {
    /// Configuration file; searched for in the usual places when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Configuration profile (also read from FRACK_PROFILE).
    #[arg(long)]
    profile: Option<String>,

    /// Request path.
    #[arg(long, default_value = "/")]
    path: String,

    /// Methods to invoke, in order.
    #[arg(default_values_t = [String::from("GET"), String::from("HEAD")])]
    methods: Vec<String>,
}

async fn hello() -> Response {
    Response::new(Status::OK)
        .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .with_body("Hello!")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    if let Some(profile) = &args.profile {
        loader = loader.profile(profile);
    }

    let app = Application::builder()
        .loader(loader)
        .with_logging()
        .handler(hello)?;

    for method in &args.methods {
        let method: Method = method.to_uppercase().parse()?;
        let response = app.respond(Request::new(method.clone(), &args.path)).await;

        println!("{method} {}", args.path);
        println!("  {}", response.status());
        for (name, value) in response.headers() {
            println!("  {name}: {}", value.to_str().unwrap_or("<binary>"));
        }
        let body = response.into_body().to_bytes().await?;
        println!("  body: {:?}", String::from_utf8_lossy(&body));
    }

    info!("Done");
    Ok(())
}
