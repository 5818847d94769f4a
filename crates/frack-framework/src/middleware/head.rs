//! HEAD request handling.

use std::task::{Context, Poll};

use frack_core::{Failure, Method, Outcome, Request, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::trace;

/// Answers HEAD requests by running the inner stage as a GET and dropping the
/// body it produced.
///
/// Status and headers pass through untouched, `Content-Length` included, so
/// the client sees exactly what a GET would have advertised. Every other
/// method is delegated unchanged, and failures are never touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadLayer;

impl<S> Layer<S> for HeadLayer {
    type Service = HeadService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HeadService { inner }
    }
}

/// The [`Service`] produced by [`HeadLayer`].
#[derive(Debug, Clone)]
pub struct HeadService<S> {
    inner: S,
}

impl<S> Service<Request> for HeadService<S>
where
    S: Service<Request, Response = Response, Error = Failure>,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Failure;
    type Future = BoxFuture<'static, Outcome>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        if req.method() != Method::HEAD {
            return Box::pin(self.inner.call(req));
        }

        trace!(path = %req.path(), "serving HEAD as GET");
        *req.method_mut() = Method::GET;
        let response = self.inner.call(req);
        Box::pin(async move {
            let mut response = response.await?;
            response.strip_body();
            Ok(response)
        })
    }
}
