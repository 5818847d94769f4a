//! Frack Runtime - configuration and startup for Frack pipelines.
//!
//! This crate provides:
//! - Layered configuration loading with figment (`frack.toml`, `FRACK_*`)
//! - Logging setup driven by that configuration
//! - [`Application`]: the pipeline described by the configuration, composed
//!   once around your handler and immutable afterwards
//!
//! ```rust,ignore
//! use frack_runtime::Application;
//!
//! #[tokio::main]
//! async fn main() -> frack_runtime::RuntimeResult<()> {
//!     let app = Application::builder().with_logging().handler(hello)?;
//!
//!     // Hand `app.handler()` to a serving loop, or call it directly:
//!     let response = app.respond(Request::new(Method::GET, "/")).await;
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod config;
pub mod error;
pub mod logging;

// Re-exports
pub use application::{Application, ApplicationBuilder, middleware_from_config};
pub use config::{ConfigError, ConfigLoader, ConfigResult, FrackConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, init_from_config};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
