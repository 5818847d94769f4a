//! Turns panics in inner stages into failures.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::task::{Context, Poll};

use frack_core::{Failure, Outcome, Request, Response};
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use tower::{Layer, Service};

/// Catches a panic raised while the inner stage builds its future or while
/// that future runs, and reports it as [`Failure::panicked`].
///
/// Handlers are already guarded by [`HandlerService`](crate::HandlerService);
/// this layer is for hand-written [`Service`]s and middleware that sit between
/// it and the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatchPanicLayer;

impl<S> Layer<S> for CatchPanicLayer {
    type Service = CatchPanic<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CatchPanic { inner }
    }
}

/// The [`Service`] produced by [`CatchPanicLayer`].
#[derive(Debug, Clone)]
pub struct CatchPanic<S> {
    inner: S,
}

impl<S> Service<Request> for CatchPanic<S>
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

    fn call(&mut self, req: Request) -> Self::Future {
        match catch_unwind(AssertUnwindSafe(|| self.inner.call(req))) {
            Ok(outcome) => Box::pin(
                AssertUnwindSafe(outcome)
                    .catch_unwind()
                    .map(|caught| caught.unwrap_or_else(|payload| Err(Failure::panicked(payload)))),
            ),
            Err(payload) => Box::pin(future::ready(Err(Failure::panicked(payload)))),
        }
    }
}
