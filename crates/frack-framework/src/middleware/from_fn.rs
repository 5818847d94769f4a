//! Middleware written as plain async functions.

use std::fmt;
use std::future::Future;
use std::task::{Context, Poll};

use frack_core::{Failure, Outcome, Request, Response};
use futures::future::BoxFuture;
use tower::util::BoxService;
use tower::{Layer, Service};

/// Creates a layer from an async function taking the request and a [`Next`].
///
/// The function decides whether and how to call the rest of the pipeline:
///
/// ```rust,ignore
/// let powered_by = from_fn(|req: Request, next: Next| async move {
///     let response = next.run(req).await?;
///     Ok::<_, Failure>(response.with_header(
///         HeaderName::from_static("x-powered-by"),
///         HeaderValue::from_static("frack"),
///     ))
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> FromFnLayer<F>
where
    F: Fn(Request, Next) -> Fut + Clone,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    FromFnLayer { f }
}

/// A [`Layer`] built by [`from_fn`].
#[derive(Clone)]
pub struct FromFnLayer<F> {
    f: F,
}

impl<S, F> Layer<S> for FromFnLayer<F>
where
    F: Clone,
{
    type Service = FromFn<F, S>;

    fn layer(&self, inner: S) -> Self::Service {
        FromFn {
            f: self.f.clone(),
            inner,
        }
    }
}

impl<F> fmt::Debug for FromFnLayer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFnLayer")
            .field("f", &std::any::type_name::<F>())
            .finish()
    }
}

/// The [`Service`] produced by [`FromFnLayer`].
#[derive(Clone)]
pub struct FromFn<F, S> {
    f: F,
    inner: S,
}

impl<F, S> fmt::Debug for FromFn<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFn")
            .field("f", &std::any::type_name::<F>())
            .finish_non_exhaustive()
    }
}

impl<F, Fut, S> Service<Request> for FromFn<F, S>
where
    F: Fn(Request, Next) -> Fut,
    Fut: Future<Output = Outcome> + Send + 'static,
    S: Service<Request, Response = Response, Error = Failure> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Failure;
    type Future = BoxFuture<'static, Outcome>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // Hand the readied service to `next` and keep a fresh clone.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let next = Next {
            inner: BoxService::new(inner),
        };
        Box::pin((self.f)(req, next))
    }
}

/// The remainder of the pipeline, as seen from a [`from_fn`] middleware.
///
/// [`run`](Self::run) consumes `Next`, so the rest of the pipeline runs at
/// most once per invocation. Dropping it without running short-circuits.
pub struct Next {
    inner: BoxService<Request, Response, Failure>,
}

impl Next {
    /// Runs the rest of the pipeline.
    pub async fn run(self, req: Request) -> Outcome {
        let Next { mut inner } = self;
        inner.call(req).await
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use frack_core::header::{HeaderName, HeaderValue};
    use frack_core::{Method, Status, StatusCode};
    use tokio_test::assert_ok;
    use tower::{ServiceExt, service_fn};

    use super::*;

    fn counting_terminal(
        calls: Arc<AtomicUsize>,
    ) -> impl Service<Request, Response = Response, Error = Failure, Future: Send + 'static>
    + Clone
    + Send
    + 'static {
        service_fn(move |_req: Request| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Failure>(Response::ok("from terminal")) }
        })
    }

    #[tokio::test]
    async fn test_wraps_the_response() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = from_fn(|req: Request, next: Next| async move {
            let response = next.run(req).await?;
            Ok::<_, Failure>(response.with_header(
                HeaderName::from_static("x-powered-by"),
                HeaderValue::from_static("frack"),
            ))
        })
        .layer(counting_terminal(calls.clone()));

        let response = assert_ok!(svc.oneshot(Request::default()).await);
        assert_eq!(response.headers().get("x-powered-by").unwrap(), "frack");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_the_rest() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = from_fn(|req: Request, next: Next| async move {
            if req.method() == Method::DELETE {
                return Ok(Response::new(Status::from(StatusCode::METHOD_NOT_ALLOWED)));
            }
            next.run(req).await
        })
        .layer(counting_terminal(calls.clone()));

        let response = assert_ok!(svc.clone().oneshot(Request::new(Method::DELETE, "/")).await);
        assert_eq!(response.status().code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_ok!(svc.oneshot(Request::new(Method::GET, "/")).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
