//! Per-invocation deadlines.

use std::task::{Context, Poll};
use std::time::Duration;

use frack_core::{Failure, Outcome, Request, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::debug;

/// Gives the inner stage a fixed amount of time to produce its outcome.
///
/// The request is handed a child of its cancellation token. When the deadline
/// passes, the child is cancelled, the inner future is dropped and the
/// invocation fails with [`Failure::timed_out`]. Cancelling the caller's
/// token still reaches the inner stage through the child.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    duration: Duration,
}

impl TimeoutLayer {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = Timeout<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Timeout {
            inner,
            duration: self.duration,
        }
    }
}

/// The [`Service`] produced by [`TimeoutLayer`].
#[derive(Debug, Clone)]
pub struct Timeout<S> {
    inner: S,
    duration: Duration,
}

impl<S> Service<Request> for Timeout<S>
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
        let duration = self.duration;
        let token = req.cancellation().child_token();
        req.set_cancellation(token.clone());
        let outcome = self.inner.call(req);

        Box::pin(async move {
            match tokio::time::timeout(duration, outcome).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    token.cancel();
                    debug!(?duration, "Inner stage missed its deadline");
                    Err(Failure::timed_out(duration))
                }
            }
        })
    }
}
