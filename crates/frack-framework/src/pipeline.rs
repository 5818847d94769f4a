//! Pipeline composition.
//!
//! A pipeline is an ordered list of [`Middleware`] wrapped around one terminal
//! handler. The first middleware listed is the outermost: it sees the request
//! first and the outcome last.
//!
//! ```text
//! compose([log, head], hello)  ==  log(head(hello))
//!
//!   request ──► log ──► head ──► hello
//!   outcome ◄── log ◄── head ◄──┘
//! ```
//!
//! Composing performs no I/O and can happen once at startup; the composed
//! [`BoxedHandler`] is cheap to clone and safe to invoke concurrently.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use frack_core::{Failure, Method, Outcome, Request, Response};
use futures::future::BoxFuture;
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service, ServiceExt};
use tracing::debug;

use crate::handler::{Handler, HandlerService};
use crate::middleware::{
    BufferLayer, CatchPanicLayer, HeadLayer, LogLayer, Next, TimeoutLayer, from_fn,
};

/// A type-erased request handler: terminal, or already wrapped in middleware.
pub type BoxedHandler = BoxCloneSyncService<Request, Response, Failure>;

type Wrap = dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync;

/// Boxes a handler function as a terminal stage.
pub fn handler<H, T>(handler: H) -> BoxedHandler
where
    H: Handler<T>,
    T: 'static,
{
    BoxCloneSyncService::new(HandlerService::new(handler))
}

/// Boxes any compatible tower service as a terminal stage.
pub fn service<S>(service: S) -> BoxedHandler
where
    S: Service<Request, Response = Response, Error = Failure> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    BoxCloneSyncService::new(service)
}

// ============================================================================
// Middleware
// ============================================================================

/// A named wrapper that turns one handler into another.
///
/// Any tower [`Layer`] over [`BoxedHandler`] can be used; the built-in ones
/// have their own constructors.
#[derive(Clone)]
pub struct Middleware {
    name: Cow<'static, str>,
    wrap: Arc<Wrap>,
}

impl Middleware {
    /// Wraps a tower layer under `name`.
    pub fn new<L>(name: impl Into<Cow<'static, str>>, layer: L) -> Self
    where
        L: Layer<BoxedHandler> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Failure>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        Self {
            name: name.into(),
            wrap: Arc::new(move |inner: BoxedHandler| BoxCloneSyncService::new(layer.layer(inner))),
        }
    }

    /// Serves HEAD requests as GET with the body removed.
    pub fn head() -> Self {
        Self::new("head", HeadLayer)
    }

    /// Logs every invocation.
    pub fn log() -> Self {
        Self::new("log", LogLayer::new())
    }

    /// Logs every invocation, tagged with a route name.
    pub fn log_route(route: impl Into<Arc<str>>) -> Self {
        Self::new("log", LogLayer::new().route(route))
    }

    pub fn catch_panic() -> Self {
        Self::new("catch_panic", CatchPanicLayer)
    }

    pub fn buffer() -> Self {
        Self::new("buffer", BufferLayer)
    }

    pub fn timeout(duration: Duration) -> Self {
        Self::new("timeout", TimeoutLayer::new(duration))
    }

    /// A middleware written as an async function. See [`from_fn`].
    pub fn from_fn<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self::new(name, from_fn(f))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wraps `inner`, producing a handler with this middleware's behavior.
    pub fn wrap(&self, inner: BoxedHandler) -> BoxedHandler {
        (self.wrap)(inner)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Middleware").field(&self.name).finish()
    }
}

/// Wraps `terminal` in `middlewares`, first listed outermost.
///
/// An empty list returns `terminal` unchanged.
pub fn compose<I>(middlewares: I, terminal: BoxedHandler) -> BoxedHandler
where
    I: IntoIterator<Item = Middleware>,
    I::IntoIter: DoubleEndedIterator,
{
    middlewares
        .into_iter()
        .rev()
        .fold(terminal, |inner, middleware| middleware.wrap(inner))
}

/// Runs one request through `handler`.
///
/// Every invocation ends in exactly one outcome; panics and cancellation come
/// back as a [`Failure`].
pub async fn invoke(handler: &BoxedHandler, request: Request) -> Outcome {
    handler.clone().oneshot(request).await
}

// ============================================================================
// Pipeline
// ============================================================================

/// A composed handler that remembers which middleware it was built from.
///
/// ```rust,ignore
/// let pipeline = Pipeline::builder().log().head().handler(hello);
/// let response = pipeline.respond(Request::new(Method::HEAD, "/")).await;
/// ```
#[derive(Clone)]
pub struct Pipeline {
    middlewares: Arc<[Middleware]>,
    handler: BoxedHandler,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Composes `middlewares` around `terminal`.
    pub fn new<I>(middlewares: I, terminal: BoxedHandler) -> Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        let middlewares: Arc<[Middleware]> = middlewares.into_iter().collect();
        let handler = compose(middlewares.iter().cloned(), terminal);
        Self {
            middlewares,
            handler,
        }
    }

    /// Runs one request through the pipeline.
    pub async fn invoke(&self, request: Request) -> Outcome {
        invoke(&self.handler, request).await
    }

    /// Runs one request, answering any failure with a plain
    /// `500 Internal Server Error`. For HEAD requests that answer has
    /// no body but keeps its `Content-Length`.
    pub async fn respond(&self, request: Request) -> Response {
        let head = request.method() == Method::HEAD;
        match self.invoke(request).await {
            Ok(response) => response,
            Err(failure) => {
                debug!(cause = %failure, "Answering failure with a server error");
                let mut response = failure.to_response();
                if head {
                    response.strip_body();
                }
                response
            }
        }
    }

    /// The composed handler.
    pub fn handler(&self) -> BoxedHandler {
        self.handler.clone()
    }

    pub fn into_handler(self) -> BoxedHandler {
        self.handler
    }

    /// Middleware names, outermost first.
    pub fn middleware_names(&self) -> impl Iterator<Item = &str> {
        self.middlewares.iter().map(Middleware::name)
    }
}

impl Service<Request> for Pipeline {
    type Response = Response;
    type Error = Failure;
    type Future = BoxFuture<'static, Outcome>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.handler.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        self.handler.call(req)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("middlewares", &self.middlewares)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Pipeline`]. Middleware is listed outermost first.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    middlewares: Vec<Middleware>,
}

impl PipelineBuilder {
    /// Appends any middleware.
    pub fn layer(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn head(self) -> Self {
        self.layer(Middleware::head())
    }

    pub fn log(self) -> Self {
        self.layer(Middleware::log())
    }

    pub fn catch_panic(self) -> Self {
        self.layer(Middleware::catch_panic())
    }

    pub fn buffer(self) -> Self {
        self.layer(Middleware::buffer())
    }

    pub fn timeout(self, duration: Duration) -> Self {
        self.layer(Middleware::timeout(duration))
    }

    pub fn from_fn<F, Fut>(self, name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.layer(Middleware::from_fn(name, f))
    }

    /// Finishes the pipeline with a handler function.
    pub fn handler<H, T>(self, h: H) -> Pipeline
    where
        H: Handler<T>,
        T: 'static,
    {
        Pipeline::new(self.middlewares, handler(h))
    }

    /// Finishes the pipeline with a tower service.
    pub fn service<S>(self, s: S) -> Pipeline
    where
        S: Service<Request, Response = Response, Error = Failure> + Clone + Send + Sync + 'static,
        S::Future: Send + 'static,
    {
        Pipeline::new(self.middlewares, service(s))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use frack_core::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
    use frack_core::{Body, Cause, Status};
    use parking_lot::Mutex;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::test_support::CapturedLogs;

    async fn hello() -> Response {
        Response::new(Status::OK)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_body(Body::from_chunks(["Hello!"]))
    }

    /// A middleware that records its name on the way in and out.
    fn tracer(name: &'static str, trail: Arc<Mutex<Vec<String>>>) -> Middleware {
        Middleware::from_fn(name, move |req: Request, next: Next| {
            let trail = trail.clone();
            async move {
                trail.lock().push(format!("{name}:in"));
                let outcome = next.run(req).await;
                trail.lock().push(format!("{name}:out"));
                outcome
            }
        })
    }

    #[tokio::test]
    async fn test_empty_compose_is_identity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let terminal = handler(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { "bare" }
        });

        let composed = compose(Vec::new(), terminal);
        let response = assert_ok!(invoke(&composed, Request::default()).await);

        assert_eq!(response.into_body().to_bytes().await.unwrap(), "bare");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_listed_is_outermost() {
        let trail = Arc::new(Mutex::new(Vec::new()));
        let composed = compose(
            [tracer("a", trail.clone()), tracer("b", trail.clone())],
            handler(hello),
        );

        assert_ok!(invoke(&composed, Request::default()).await);
        assert_eq!(*trail.lock(), ["a:in", "b:in", "b:out", "a:out"]);
    }

    #[tokio::test]
    async fn test_head_response_has_get_headers_and_no_body() {
        let pipeline = Pipeline::builder().head().handler(hello);

        let get = assert_ok!(pipeline.invoke(Request::new(Method::GET, "/")).await);
        let head = assert_ok!(pipeline.invoke(Request::new(Method::HEAD, "/")).await);

        assert_eq!(head.status().to_string(), "200 OK");
        assert_eq!(head.headers(), get.headers());
        assert_eq!(head.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
        assert!(head.into_body().into_chunks().await.unwrap().is_empty());
        assert_eq!(get.into_body().into_chunks().await.unwrap(), ["Hello!"]);
    }

    #[tokio::test]
    async fn test_panic_through_log_and_head() {
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        async fn explode() -> Response {
            panic!("could not render");
        }
        let pipeline = Pipeline::builder().log().head().handler(explode);

        let err = assert_err!(pipeline.invoke(Request::new(Method::HEAD, "/")).await);
        assert!(matches!(err.cause(), Cause::Panicked(m) if m == "could not render"));

        let lines = logs.lines_with("Request failed");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("handler panicked: could not render"));
    }

    #[tokio::test]
    async fn test_respond_maps_failure_to_server_error() {
        let pipeline = Pipeline::builder().handler(|| async {
            Err::<Response, _>(Failure::msg("backend down"))
        });

        let response = pipeline.respond(Request::default()).await;
        assert_eq!(response.status().to_string(), "500 Internal Server Error");
        assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "21");
    }

    #[tokio::test]
    async fn test_respond_to_failed_head_has_no_body() {
        let pipeline = Pipeline::builder().log().head().handler(|| async {
            Err::<Response, _>(Failure::msg("backend down"))
        });

        let response = pipeline.respond(Request::new(Method::HEAD, "/")).await;
        assert_eq!(response.status().to_string(), "500 Internal Server Error");
        assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "21");
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_invocations_share_the_pipeline() {
        async fn echo_path(req: Request) -> String {
            tokio::task::yield_now().await;
            req.path().to_string()
        }
        let pipeline = Pipeline::builder().log().head().handler(echo_path);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    let response = pipeline.invoke(Request::new(Method::GET, format!("/{i}"))).await;
                    response.unwrap().into_body().to_bytes().await.unwrap()
                })
            })
            .collect();

        for (i, task) in tasks.into_iter().enumerate() {
            assert_eq!(task.await.unwrap(), format!("/{i}"));
        }
    }

    #[test]
    fn test_middleware_names() {
        let pipeline = Pipeline::builder()
            .log()
            .head()
            .timeout(Duration::from_secs(1))
            .handler(hello);
        assert_eq!(
            pipeline.middleware_names().collect::<Vec<_>>(),
            ["log", "head", "timeout"]
        );
    }

    #[tokio::test]
    async fn test_pipeline_is_a_service() {
        let pipeline = Pipeline::builder().head().handler(hello);
        let response = assert_ok!(pipeline.oneshot(Request::default()).await);
        assert_eq!(response.status().code(), frack_core::StatusCode::OK);
    }
}
