//! # Frack Framework
//!
//! Handlers, middleware and pipeline composition on top of `frack-core`.
//!
//! This layer provides:
//! - [`Handler`] for axum-style async handler functions with extractors
//! - Built-in middleware: HEAD handling, request logging, panic catching,
//!   body buffering, timeouts and [`from_fn`] closures
//! - [`compose`] / [`invoke`] and the [`Pipeline`] wrapper
//! - [`ServiceBuilderExt`] for building the same stacks with `tower`
//!
//! ```rust,ignore
//! use frack_framework::prelude::*;
//!
//! async fn hello() -> &'static str {
//!     "Hello!"
//! }
//!
//! let pipeline = Pipeline::builder().log().head().handler(hello);
//! let outcome = pipeline.invoke(Request::new(Method::HEAD, "/")).await;
//! ```

pub mod error;
pub mod extractor;
pub mod handler;
pub mod json;
pub mod middleware;
pub mod pipeline;

#[cfg(test)]
mod test_support;

pub use error::{ExtractError, ExtractResult};
pub use extractor::{FromRequest, Path, Query};
pub use handler::{Handler, HandlerService, IntoOutcome, ServiceBuilderExt};
pub use json::Json;
pub use middleware::{Next, from_fn};
pub use pipeline::{BoxedHandler, Middleware, Pipeline, PipelineBuilder, compose, invoke};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use frack_core::{
        Body, Bytes, CancellationToken, Cause, Failure, HeaderMap, Method, Outcome, Request,
        Response, Status, StatusCode,
    };

    pub use crate::extractor::{FromRequest, Path, Query};
    pub use crate::handler::{Handler, IntoOutcome, ServiceBuilderExt};
    pub use crate::json::Json;
    pub use crate::middleware::{Next, from_fn};
    pub use crate::pipeline::{BoxedHandler, Middleware, Pipeline, compose, invoke};
}
