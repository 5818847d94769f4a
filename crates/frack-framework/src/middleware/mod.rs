//! Built-in middleware.
//!
//! Each middleware is an ordinary tower [`Layer`](tower::Layer) whose service
//! maps `Request` to `Result<Response, Failure>`, so any of them can be
//! stacked with `ServiceBuilder` or wrapped as a named
//! [`Middleware`](crate::Middleware) for a [`Pipeline`](crate::Pipeline).
//!
//! | Layer               | Effect                                                 |
//! |---------------------|--------------------------------------------------------|
//! | [`HeadLayer`]       | serves HEAD as GET and drops the body                  |
//! | [`LogLayer`]        | one structured record per invocation                   |
//! | [`CatchPanicLayer`] | panics below become [`Failure`](frack_core::Failure)s  |
//! | [`BufferLayer`]     | reads streamed response bodies to the end              |
//! | [`TimeoutLayer`]    | cancels the inner stage after a deadline               |
//! | [`from_fn`]         | an async function with a [`Next`] continuation         |

mod buffer;
mod catch_panic;
mod from_fn;
mod head;
mod log;
mod timeout;

pub use buffer::{Buffer, BufferLayer};
pub use catch_panic::{CatchPanic, CatchPanicLayer};
pub use from_fn::{FromFn, FromFnLayer, Next, from_fn};
pub use head::{HeadLayer, HeadService};
pub use log::{LogLayer, LogService};
pub use timeout::{Timeout, TimeoutLayer};
