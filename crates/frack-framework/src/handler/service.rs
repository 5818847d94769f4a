//! Core handler service for the Frack framework.
//!
//! [`HandlerService<H, T>`] is the innermost stage of every pipeline: it wraps
//! a single [`Handler`] and implements `tower::Service<Request>`. All
//! cross-cutting concerns are expressed as ordinary tower [`Layer`]s stacked
//! *on top*.
//!
//! [`Layer`]: tower::Layer

use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::task::{Context, Poll};

use frack_core::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use frack_core::{Body, Bytes, Failure, Outcome, Request, Response, Status, StatusCode};
use futures::FutureExt;
use futures::future::BoxFuture;
use tower::Service;
use tracing::trace;

use super::traits::Handler;

// ============================================================================
// IntoOutcome
// ============================================================================

/// A trait for types that can be returned from handlers.
pub trait IntoOutcome {
    /// Converts the handler's return value into the invocation's outcome.
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Outcome {
        Ok(self)
    }
}

/// `Ok` values are converted in turn; errors become the failure.
impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<Failure>,
{
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(value) => value.into_outcome(),
            Err(err) => Err(err.into()),
        }
    }
}

impl IntoOutcome for Status {
    fn into_outcome(self) -> Outcome {
        Ok(Response::new(self))
    }
}

impl IntoOutcome for StatusCode {
    fn into_outcome(self) -> Outcome {
        Ok(Response::new(self))
    }
}

impl<B> IntoOutcome for (Status, B)
where
    B: Into<Body>,
{
    fn into_outcome(self) -> Outcome {
        let (status, body) = self;
        Ok(Response::new(status).with_body(body))
    }
}

impl<B> IntoOutcome for (StatusCode, B)
where
    B: Into<Body>,
{
    fn into_outcome(self) -> Outcome {
        (Status::from(self.0), self.1).into_outcome()
    }
}

/// Plain text: `200 OK`, `text/plain`, with a `Content-Length`.
impl IntoOutcome for &'static str {
    fn into_outcome(self) -> Outcome {
        Bytes::from_static(self.as_bytes()).into_text()
    }
}

impl IntoOutcome for String {
    fn into_outcome(self) -> Outcome {
        Bytes::from(self).into_text()
    }
}

impl IntoOutcome for Bytes {
    fn into_outcome(self) -> Outcome {
        Ok(Response::new(Status::OK)
            .with_header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            )
            .with_header(CONTENT_LENGTH, HeaderValue::from(self.len()))
            .with_body(self))
    }
}

trait IntoText {
    fn into_text(self) -> Outcome;
}

impl IntoText for Bytes {
    fn into_text(self) -> Outcome {
        Ok(Response::new(Status::OK)
            .with_header(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )
            .with_header(CONTENT_LENGTH, HeaderValue::from(self.len()))
            .with_body(self))
    }
}

// ============================================================================
// HandlerService
// ============================================================================

/// A tower [`Service`] that calls a single generic handler.
///
/// Besides calling the handler it enforces the terminal-stage guarantees:
///
/// - a panic inside the handler becomes [`Failure::panicked`]
/// - if the request's cancellation token fires first, the handler future is
///   dropped and the outcome is [`Failure::cancelled`]
///
/// # Example
///
/// ```rust,ignore
/// let svc = HandlerService::new(hello);
/// // Apply middleware on top:
/// let svc = ServiceBuilder::new().log().head().service(svc);
/// ```
pub struct HandlerService<H, T> {
    handler: H,
    // PhantomData<fn() -> T> is Send + Sync regardless of T.
    _marker: PhantomData<fn() -> T>,
}

impl<H: Clone, T> Clone for HandlerService<H, T> {
    fn clone(&self) -> Self {
        HandlerService {
            handler: self.handler.clone(),
            _marker: PhantomData,
        }
    }
}

impl<H, T> HandlerService<H, T>
where
    H: Handler<T>,
{
    /// Wraps `handler` in a `HandlerService`.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

/// Allows `HandlerService::new(f)` to be omitted in favour of `f.into()` when
/// the target type can be inferred from context.
impl<H, T> From<H> for HandlerService<H, T>
where
    H: Handler<T>,
{
    fn from(handler: H) -> Self {
        HandlerService::new(handler)
    }
}

impl<H, T> Service<Request> for HandlerService<H, T>
where
    H: Handler<T>,
    T: 'static,
{
    type Response = Response;
    type Error = Failure;
    type Future = BoxFuture<'static, Outcome>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let handler = self.handler.clone();
        let token = req.cancellation().clone();
        Box::pin(async move {
            if token.is_cancelled() {
                trace!("request cancelled before the handler started");
                return Err(Failure::cancelled());
            }

            let run = AssertUnwindSafe(handler.call(req)).catch_unwind();
            tokio::select! {
                biased;
                () = token.cancelled() => Err(Failure::cancelled()),
                outcome = run => outcome.unwrap_or_else(|payload| Err(Failure::panicked(payload))),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use frack_core::{Cause, Method};
    use tokio_test::{assert_err, assert_ok};
    use tower::ServiceExt;

    use super::*;
    use crate::extractor::Path;

    async fn hello(_req: Request) -> &'static str {
        "Hello!"
    }

    #[tokio::test]
    async fn test_text_handler() {
        let response = assert_ok!(HandlerService::new(hello).oneshot(Request::default()).await);

        assert_eq!(response.status().to_string(), "200 OK");
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "6");
        let chunks = response.into_body().into_chunks().await.unwrap();
        assert_eq!(chunks, ["Hello!"]);
    }

    #[tokio::test]
    async fn test_extractor_handler() {
        async fn describe(method: Method, Path(path): Path) -> String {
            format!("{method} {path}")
        }

        let req = Request::new(Method::POST, "/cars");
        let response = assert_ok!(HandlerService::new(describe).oneshot(req).await);
        let bytes = response.into_body().to_bytes().await.unwrap();
        assert_eq!(&bytes[..], b"POST /cars");
    }

    #[tokio::test]
    async fn test_error_result_becomes_failure() {
        async fn broken() -> Result<Response, Failure> {
            Err(Failure::msg("database unavailable"))
        }

        let err = assert_err!(HandlerService::new(broken).oneshot(Request::default()).await);
        assert_eq!(err.to_string(), "handler failed: database unavailable");
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        async fn explode() -> Response {
            panic!("output construction failed");
        }

        let err = assert_err!(HandlerService::new(explode).oneshot(Request::default()).await);
        assert!(matches!(err.cause(), Cause::Panicked(m) if m == "output construction failed"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let handler = move || {
            let flag = flag.clone();
            async move {
                flag.store(true, Ordering::SeqCst);
                "too late"
            }
        };

        let req = Request::default();
        req.cancellation().cancel();
        let err = assert_err!(HandlerService::new(handler).oneshot(req).await);

        assert!(matches!(err.cause(), Cause::Cancelled));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_while_running() {
        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_secs(60)).await;
            "finished"
        }

        let req = Request::default();
        let token = req.cancellation().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();
        });

        let err = assert_err!(HandlerService::new(slow).oneshot(req).await);
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_status_tuple_outcome() {
        let response = (StatusCode::NOT_FOUND, "nothing here")
            .into_outcome()
            .unwrap();
        assert_eq!(response.status().to_string(), "404 Not Found");
        assert_eq!(response.body().content_length(), Some(12));
    }
}
