//! Failure types for the Frack pipeline.
//!
//! Every pipeline invocation ends in exactly one [`Outcome`]: a [`Response`]
//! or a [`Failure`]. Panics, handler errors, body stream errors and
//! cancellation are all folded into a `Failure` at the point they occur, so
//! nothing crosses a middleware boundary as a raw fault.

use std::any::Any;
use std::time::Duration;

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use http::StatusCode;
use thiserror::Error;

use crate::body::Body;
use crate::response::{Response, Status};

/// Type-erased error used as the source of a [`Cause::Handler`] failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The result of invoking a handler: exactly one of a response or a failure.
pub type Outcome = Result<Response, Failure>;

// =============================================================================
// Failure
// =============================================================================

/// The error half of an [`Outcome`].
///
/// A `Failure` is a single kind of error that carries the [`Cause`] it was
/// raised for. Middleware that only observes outcomes must hand a `Failure`
/// back unchanged.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Failure {
    cause: Cause,
}

/// Why a pipeline invocation failed.
#[derive(Debug, Error)]
pub enum Cause {
    /// The handler (or a stage acting for it) returned an error.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    /// A stage panicked while producing its output.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// The request's cancellation token fired before a response was produced.
    #[error("request cancelled")]
    Cancelled,

    /// A timeout stage gave up waiting for the inner stage.
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
}

impl Failure {
    /// Creates a failure from any error raised by a handler.
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self {
            cause: Cause::Handler(err.into()),
        }
    }

    /// Creates a handler failure from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(message.into())
    }

    /// Creates a failure from a panic payload captured with `catch_unwind`.
    pub fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self {
            cause: Cause::Panicked(message),
        }
    }

    /// Creates a failure for a cancelled request.
    pub fn cancelled() -> Self {
        Self {
            cause: Cause::Cancelled,
        }
    }

    /// Creates a failure for a request that exceeded `after`.
    pub fn timed_out(after: Duration) -> Self {
        Self {
            cause: Cause::TimedOut(after),
        }
    }

    /// Returns the cause of this failure.
    pub fn cause(&self) -> &Cause {
        &self.cause
    }

    /// Consumes the failure, returning its cause.
    pub fn into_cause(self) -> Cause {
        self.cause
    }

    /// Returns `true` if the request was cancelled or timed out.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, Cause::Cancelled | Cause::TimedOut(_))
    }

    /// Returns `true` if a stage panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self.cause, Cause::Panicked(_))
    }

    /// Builds the generic server-error response a host returns for an
    /// unhandled failure.
    ///
    /// The cause is deliberately left out of the body; log it instead.
    pub fn to_response(&self) -> Response {
        let status = Status::from(StatusCode::INTERNAL_SERVER_ERROR);
        let body = status.reason().to_string();
        let mut response = Response::new(status);
        let headers = response.headers_mut();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        *response.body_mut() = Body::from(body);
        response
    }
}

impl From<Cause> for Failure {
    fn from(cause: Cause) -> Self {
        Self { cause }
    }
}

impl From<BoxError> for Failure {
    fn from(err: BoxError) -> Self {
        Self::new(err)
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Self::new(err)
    }
}

impl From<http::Error> for Failure {
    fn from(err: http::Error) -> Self {
        Self::new(err)
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Self::msg(message)
    }
}

impl From<&'static str> for Failure {
    fn from(message: &'static str) -> Self {
        Self::msg(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payload_message() {
        let failure = Failure::panicked(Box::new("boom"));
        assert!(failure.is_panic());
        assert_eq!(failure.to_string(), "handler panicked: boom");

        let failure = Failure::panicked(Box::new(String::from("owned boom")));
        assert!(matches!(failure.cause(), Cause::Panicked(m) if m == "owned boom"));

        let failure = Failure::panicked(Box::new(42_u32));
        assert!(matches!(failure.cause(), Cause::Panicked(m) if m == "non-string panic payload"));
    }

    #[test]
    fn test_handler_failure_keeps_source() {
        let io = std::io::Error::other("disk on fire");
        let failure = Failure::from(io);
        assert_eq!(failure.to_string(), "handler failed: disk on fire");
        let source = std::error::Error::source(failure.cause()).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk on fire"));
    }

    #[test]
    fn test_cancellation_kinds() {
        assert!(Failure::cancelled().is_cancelled());
        assert!(Failure::timed_out(Duration::from_secs(1)).is_cancelled());
        assert!(!Failure::msg("nope").is_cancelled());
    }

    #[test]
    fn test_server_error_response() {
        let response = Failure::msg("secret detail").to_response();
        assert_eq!(response.status().to_string(), "500 Internal Server Error");
        assert_eq!(
            response.headers().get(CONTENT_LENGTH),
            Some(&HeaderValue::from(21_usize))
        );
    }
}
