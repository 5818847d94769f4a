//! # Frack
//!
//! Composable request handlers and middleware, built on `tower`.
//!
//! ## Overview
//!
//! A terminal handler turns a [`Request`](prelude::Request) into exactly one
//! outcome: a [`Response`](prelude::Response) or a
//! [`Failure`](prelude::Failure). Middleware wraps a handler to add
//! cross-cutting behavior, and an ordered list of middleware composed around a
//! handler is itself a handler.
//!
//! ```text
//!               ┌───────────────────── Pipeline ─────────────────────┐
//!   Request ───▶│  log  ───▶  head  ───▶  handler (async fn)         │
//!   Outcome ◀───│  log  ◀───  head  ◀───┘                            │
//!               └────────────────────────────────────────────────────┘
//! ```
//!
//! - **Core** (`frack-core`): `Request`, `Response`, `Body`, `Status`, `Failure`
//! - **Framework** (`frack-framework`): handlers, extractors, middleware layers,
//!   `compose` / `invoke`, `Pipeline`
//! - **Runtime** (`frack-runtime`): configuration, logging, `Application`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use frack::prelude::*;
//!
//! async fn hello() -> &'static str {
//!     "Hello!"
//! }
//!
//! #[tokio::main]
//! async fn main() -> frack::runtime::RuntimeResult<()> {
//!     let app = Application::builder().with_logging().handler(hello)?;
//!
//!     let response = app.respond(Request::new(Method::HEAD, "/")).await;
//!     assert_eq!(response.status().to_string(), "200 OK");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use frack_core as core;
pub use frack_framework as framework;
pub use frack_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use frack::prelude::*;
/// ```
pub mod prelude {
    // Data model
    pub use frack_core::{
        Body, Bytes, CancellationToken, Cause, Failure, HeaderMap, Method, Outcome, Request,
        Response, Status, StatusCode, header,
    };

    // Handlers and extractors
    pub use frack_framework::handler::{Handler, HandlerService, IntoOutcome, Layer, ServiceBuilderExt};
    pub use frack_framework::{FromRequest, Json, Path, Query};

    // Composition
    pub use frack_framework::{BoxedHandler, Middleware, Next, Pipeline, compose, from_fn, invoke};

    // Runtime - main entry point
    pub use frack_runtime::{Application, ConfigLoader, FrackConfig};
}
