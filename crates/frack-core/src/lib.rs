//! # Frack Core
//!
//! The data model shared by every Frack crate.
//!
//! - [`Request`]: method, path, headers, a possibly streamed [`Body`] and a
//!   cancellation token
//! - [`Response`]: a [`Status`] line, repeatable headers and a chunked [`Body`]
//! - [`Failure`]: the single error kind, carrying a [`Cause`]
//! - [`Outcome`]: `Result<Response, Failure>`, exactly one of the two
//!
//! Handlers and middleware live in `frack-framework`; this crate has no
//! opinion on how they are composed.
//!
//! ```rust,ignore
//! use frack_core::{Body, Outcome, Request, Response, Status};
//!
//! async fn hello(_req: Request) -> Outcome {
//!     Ok(Response::new(Status::OK).with_body(Body::from_chunks(["Hello!"])))
//! }
//! ```

pub mod body;
pub mod error;
pub mod request;
pub mod response;

pub use body::Body;
pub use error::{BoxError, Cause, Failure, Outcome};
pub use request::{Request, RequestBuilder};
pub use response::{InvalidStatus, Response, Status};

// Re-exported so downstream crates agree on one version of the wire types.
pub use bytes::Bytes;
pub use http::{HeaderMap, Method, StatusCode, header};
pub use tokio_util::sync::CancellationToken;
