//! Extension trait for tower service builder.
//!
//! Lets the built-in middleware be stacked by name on a [`ServiceBuilder`],
//! with a handler function as the innermost stage.

use std::future::Future;
use std::time::Duration;

use frack_core::{Outcome, Request};
use tower::{Layer, ServiceBuilder};
use tower_layer::Stack;

use super::service::HandlerService;
use super::traits::Handler;
use crate::middleware::{
    BufferLayer, CatchPanicLayer, FromFnLayer, HeadLayer, LogLayer, Next, TimeoutLayer, from_fn,
};

/// Extension trait for [`tower::ServiceBuilder`] that adds the Frack
/// middleware.
///
/// Layers run outermost first, in the order they are added:
///
/// ```rust,ignore
/// let svc = ServiceBuilder::new()
///     .log()   // sees the final outcome
///     .head()  // turns HEAD into GET for everything below
///     .handler(hello);
/// ```
///
/// This trait is automatically available via `use frack::prelude::*`.
pub trait ServiceBuilderExt<L> {
    /// Wrap `handler` in a [`HandlerService`] and apply all stacked layers,
    /// returning the final composed service.
    ///
    /// Equivalent to `.service(HandlerService::new(handler))`.
    fn handler<H, T>(self, handler: H) -> L::Service
    where
        H: Handler<T>,
        L: Layer<HandlerService<H, T>>;

    /// Adds a [`HeadLayer`].
    fn head(self) -> ServiceBuilder<Stack<HeadLayer, L>>;

    /// Adds a [`LogLayer`].
    fn log(self) -> ServiceBuilder<Stack<LogLayer, L>>;

    /// Adds a [`CatchPanicLayer`].
    fn catch_panic(self) -> ServiceBuilder<Stack<CatchPanicLayer, L>>;

    /// Adds a [`BufferLayer`].
    ///
    /// Named apart from tower's own `buffer`, which queues requests.
    fn buffer_body(self) -> ServiceBuilder<Stack<BufferLayer, L>>;

    /// Adds a [`TimeoutLayer`].
    ///
    /// Unlike tower's `timeout`, the inner stage's cancellation token is
    /// cancelled and the error is a [`Failure`](frack_core::Failure).
    fn deadline(self, duration: Duration) -> ServiceBuilder<Stack<TimeoutLayer, L>>;

    /// Adds a middleware written as an async function. See [`from_fn`].
    fn from_fn<F, Fut>(self, f: F) -> ServiceBuilder<Stack<FromFnLayer<F>, L>>
    where
        F: Fn(Request, Next) -> Fut + Clone,
        Fut: Future<Output = Outcome> + Send + 'static;
}

impl<L> ServiceBuilderExt<L> for ServiceBuilder<L> {
    fn handler<H, T>(self, handler: H) -> L::Service
    where
        H: Handler<T>,
        L: Layer<HandlerService<H, T>>,
    {
        self.service(HandlerService::new(handler))
    }

    fn head(self) -> ServiceBuilder<Stack<HeadLayer, L>> {
        self.layer(HeadLayer)
    }

    fn log(self) -> ServiceBuilder<Stack<LogLayer, L>> {
        self.layer(LogLayer::new())
    }

    fn catch_panic(self) -> ServiceBuilder<Stack<CatchPanicLayer, L>> {
        self.layer(CatchPanicLayer)
    }

    fn buffer_body(self) -> ServiceBuilder<Stack<BufferLayer, L>> {
        self.layer(BufferLayer)
    }

    fn deadline(self, duration: Duration) -> ServiceBuilder<Stack<TimeoutLayer, L>> {
        self.layer(TimeoutLayer::new(duration))
    }

    fn from_fn<F, Fut>(self, f: F) -> ServiceBuilder<Stack<FromFnLayer<F>, L>>
    where
        F: Fn(Request, Next) -> Fut + Clone,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.layer(from_fn(f))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use frack_core::header::CONTENT_LENGTH;
    use frack_core::{Method, Response};
    use parking_lot::Mutex;
    use tokio_test::assert_ok;
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::CapturedLogs;

    async fn hello() -> &'static str {
        "Hello!"
    }

    #[tokio::test]
    async fn test_log_and_head_stack() {
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let svc = ServiceBuilder::new().log().head().handler(hello);
        let response = assert_ok!(svc.oneshot(Request::new(Method::HEAD, "/")).await);

        assert_eq!(response.status().to_string(), "200 OK");
        assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "6");
        assert!(response.body().is_empty());
        // The log layer sits outside head, so it sees the request as sent.
        let lines = logs.lines_with("Request completed");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("method=HEAD"));
    }

    #[tokio::test]
    async fn test_layers_run_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let (a, b) = (order.clone(), order.clone());

        let svc = ServiceBuilder::new()
            .from_fn(move |req: Request, next: Next| {
                let order = a.clone();
                async move {
                    order.lock().push("outer");
                    next.run(req).await
                }
            })
            .from_fn(move |req: Request, next: Next| {
                let order = b.clone();
                async move {
                    order.lock().push("inner");
                    next.run(req).await
                }
            })
            .catch_panic()
            .buffer_body()
            .deadline(Duration::from_secs(30))
            .service(tower::service_fn(|_req: Request| async {
                Ok::<_, frack_core::Failure>(Response::ok("done"))
            }));

        assert_ok!(svc.oneshot(Request::default()).await);
        assert_eq!(*order.lock(), ["outer", "inner"]);
    }
}
