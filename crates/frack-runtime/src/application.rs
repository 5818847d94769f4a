//! The configured application: one pipeline, built once at startup.
//!
//! ```rust,ignore
//! use frack_runtime::Application;
//!
//! async fn hello() -> &'static str {
//!     "Hello!"
//! }
//!
//! // Loads frack.toml (or defaults), initializes logging and wraps `hello`
//! // in the configured middleware, `[log, head]` unless told otherwise.
//! let app = Application::builder().with_logging().handler(hello)?;
//! let response = app.respond(Request::new(Method::GET, "/")).await;
//! ```

use std::sync::Arc;

use frack_core::{Failure, Outcome, Request, Response};
use frack_framework::{BoxedHandler, Handler, Middleware, Pipeline, pipeline};
use tower::Service;
use tracing::info;

use crate::config::{
    ConfigError, ConfigLoader, ConfigResult, FrackConfig, MiddlewareKind, PipelineConfig,
    validate_config,
};
use crate::error::RuntimeResult;
use crate::logging::LoggingBuilder;

/// An immutable, shareable application: its configuration and the pipeline
/// composed from it.
///
/// Cloning is cheap. Hosts hand [`handler`](Self::handler) to whatever
/// serving loop they run.
#[derive(Debug, Clone)]
pub struct Application {
    config: Arc<FrackConfig>,
    pipeline: Pipeline,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn config(&self) -> &FrackConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The route label from configuration.
    pub fn route(&self) -> Option<&str> {
        self.config.pipeline.name.as_deref()
    }

    /// The composed handler, for registration with a host.
    pub fn handler(&self) -> BoxedHandler {
        self.pipeline.handler()
    }

    pub async fn invoke(&self, request: Request) -> Outcome {
        self.pipeline.invoke(request).await
    }

    /// Like [`invoke`](Self::invoke), answering failures with a `500`.
    pub async fn respond(&self, request: Request) -> Response {
        self.pipeline.respond(request).await
    }
}

/// Builds the configured middleware, outermost first.
pub fn middleware_from_config(config: &PipelineConfig) -> ConfigResult<Vec<Middleware>> {
    config
        .middleware
        .iter()
        .map(|kind| match kind {
            MiddlewareKind::Log => Ok(match config.name.as_deref() {
                Some(route) => Middleware::log_route(route),
                None => Middleware::log(),
            }),
            MiddlewareKind::Head => Ok(Middleware::head()),
            MiddlewareKind::CatchPanic => Ok(Middleware::catch_panic()),
            MiddlewareKind::Buffer => Ok(Middleware::buffer()),
            MiddlewareKind::Timeout => config
                .timeout()
                .map(Middleware::timeout)
                .ok_or_else(|| ConfigError::missing("pipeline.timeout_ms")),
        })
        .collect()
}

/// Builder for [`Application`].
///
/// Configuration comes from a [`ConfigLoader`] unless an explicit
/// [`FrackConfig`] is supplied.
#[derive(Debug)]
pub struct ApplicationBuilder {
    loader: ConfigLoader,
    config: Option<FrackConfig>,
    init_logging: bool,
    middleware: Vec<Middleware>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            loader: ConfigLoader::new(),
            config: None,
            init_logging: false,
            middleware: Vec::new(),
        }
    }

    /// Loads configuration with `loader` instead of the default one.
    pub fn loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Uses `config` as is; no files or environment variables are read.
    pub fn config(mut self, config: FrackConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Installs the global subscriber from the logging configuration.
    pub fn with_logging(mut self) -> Self {
        self.init_logging = true;
        self
    }

    /// Adds middleware inside the configured ones, closest to the handler.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Finishes the application with a handler function.
    pub fn handler<H, T>(self, handler: H) -> RuntimeResult<Application>
    where
        H: Handler<T>,
        T: 'static,
    {
        self.build(pipeline::handler(handler))
    }

    /// Finishes the application with a tower service.
    pub fn service<S>(self, service: S) -> RuntimeResult<Application>
    where
        S: Service<Request, Response = Response, Error = Failure> + Clone + Send + Sync + 'static,
        S::Future: Send + 'static,
    {
        self.build(pipeline::service(service))
    }

    fn build(self, terminal: BoxedHandler) -> RuntimeResult<Application> {
        let config = match self.config {
            Some(config) => {
                validate_config(&config)?;
                config
            }
            None => self.loader.load()?,
        };

        if self.init_logging {
            LoggingBuilder::from_config(&config.logging).try_init()?;
        }

        let mut middleware = middleware_from_config(&config.pipeline)?;
        middleware.extend(self.middleware);
        let pipeline = Pipeline::new(middleware, terminal);

        info!(
            route = config.pipeline.name.as_deref(),
            middleware = ?pipeline.middleware_names().collect::<Vec<_>>(),
            "Application initialized"
        );

        Ok(Application {
            config: Arc::new(config),
            pipeline,
        })
    }
}

#[cfg(test)]
mod tests {
    use frack_core::{Method, StatusCode};
    use frack_framework::{Next, Path};
    use tokio_test::assert_ok;

    use super::*;
    use crate::config::LogLevel;
    use crate::error::RuntimeError;

    async fn hello(Path(path): Path) -> String {
        format!("Hello from {path}!")
    }

    #[test]
    fn test_default_chain() {
        let app = Application::builder()
            .config(FrackConfig::default())
            .handler(hello)
            .unwrap();

        assert_eq!(
            app.pipeline().middleware_names().collect::<Vec<_>>(),
            ["log", "head"]
        );
        assert_eq!(app.route(), Some("{*page}"));
    }

    #[test]
    fn test_configured_chain_with_extra_middleware() {
        let mut config = FrackConfig::default();
        config.pipeline.middleware = vec![
            MiddlewareKind::Log,
            MiddlewareKind::CatchPanic,
            MiddlewareKind::Timeout,
            MiddlewareKind::Head,
        ];
        config.pipeline.timeout_ms = Some(5_000);

        let app = Application::builder()
            .config(config)
            .middleware(Middleware::from_fn("auth", |req: Request, next: Next| {
                next.run(req)
            }))
            .handler(hello)
            .unwrap();

        assert_eq!(
            app.pipeline().middleware_names().collect::<Vec<_>>(),
            ["log", "catch_panic", "timeout", "head", "auth"]
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = FrackConfig::default();
        config.pipeline.middleware.push(MiddlewareKind::Timeout);

        let err = Application::builder()
            .config(config)
            .handler(hello)
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::MissingField { .. })
        ));
    }

    #[tokio::test]
    async fn test_application_serves_requests() {
        let mut config = FrackConfig::default();
        config.logging.level = LogLevel::Debug;
        let app = Application::builder().config(config).handler(hello).unwrap();

        let get = assert_ok!(app.invoke(Request::new(Method::GET, "/cars")).await);
        assert_eq!(get.into_body().to_bytes().await.unwrap(), "Hello from /cars!");

        let head = app.respond(Request::new(Method::HEAD, "/cars")).await;
        assert_eq!(head.status().code(), StatusCode::OK);
        assert!(head.body().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_one_pipeline() {
        let app = Application::builder()
            .config(FrackConfig::default())
            .handler(hello)
            .unwrap();
        let other = app.clone();

        assert!(std::ptr::eq(app.config(), other.config()));
        let response = assert_ok!(other.invoke(Request::default()).await);
        assert_eq!(response.into_body().to_bytes().await.unwrap(), "Hello from /!");
    }
}
