//! Handlers and the services that run them.
//!
//! - **Handler** ([`traits`]): the [`Handler`] trait, implemented for async
//!   functions whose arguments are [`FromRequest`](crate::FromRequest)
//!   extractors and whose return value implements [`IntoOutcome`]
//! - **Service** ([`service`]): [`HandlerService`], the innermost stage of a
//!   pipeline
//! - **Builder** ([`builder`]): [`ServiceBuilderExt`], for stacking the
//!   built-in middleware on a `tower::ServiceBuilder`
//!
//! ```rust,ignore
//! async fn hello() -> &'static str {
//!     "Hello!"
//! }
//!
//! async fn echo(Path(path): Path, body: String) -> String {
//!     format!("{path}: {body}")
//! }
//!
//! async fn strict(method: Method) -> Result<Response, Failure> {
//!     if method != Method::GET {
//!         return Err(Failure::msg("GET only"));
//!     }
//!     Ok(Response::ok("fine"))
//! }
//! ```

pub mod builder;
pub mod service;
pub mod traits;

pub use builder::ServiceBuilderExt;
pub use service::{HandlerService, IntoOutcome};
pub use traits::Handler;

pub use tower::Layer;
