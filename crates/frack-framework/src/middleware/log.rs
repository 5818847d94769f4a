//! Request logging.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use frack_core::{Failure, Outcome, Request, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::{Instrument, error, info, info_span, warn};

/// Records one structured event per invocation and returns the outcome
/// unchanged.
///
/// The inner stage runs inside a `request` span carrying `method`, `path` and
/// the optional `route` name. The event that closes it has the response
/// `status` (or the failure `cause`) and `elapsed_ms`:
///
/// - responses are logged at `INFO`
/// - cancellations and timeouts at `WARN`
/// - every other failure at `ERROR`
#[derive(Debug, Clone, Default)]
pub struct LogLayer {
    route: Option<Arc<str>>,
}

impl LogLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags every record with a route name, e.g. `"{*page}"`.
    pub fn route(mut self, route: impl Into<Arc<str>>) -> Self {
        self.route = Some(route.into());
        self
    }
}

impl<S> Layer<S> for LogLayer {
    type Service = LogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LogService {
            inner,
            route: self.route.clone(),
        }
    }
}

/// The [`Service`] produced by [`LogLayer`].
#[derive(Debug, Clone)]
pub struct LogService<S> {
    inner: S,
    route: Option<Arc<str>>,
}

impl<S> Service<Request> for LogService<S>
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
        let span = info_span!(
            "request",
            method = %req.method(),
            path = %req.path(),
            route = self.route.as_deref(),
        );
        let started = Instant::now();
        let outcome = span.in_scope(|| self.inner.call(req));

        Box::pin(
            async move {
                let outcome = outcome.await;
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                match &outcome {
                    Ok(response) => {
                        info!(status = %response.status(), elapsed_ms, "Request completed");
                    }
                    Err(failure) if failure.is_cancelled() => {
                        warn!(cause = %failure, elapsed_ms, "Request cancelled");
                    }
                    Err(failure) => {
                        error!(cause = %failure, elapsed_ms, "Request failed");
                    }
                }
                outcome
            }
            .instrument(span),
        )
    }
}
