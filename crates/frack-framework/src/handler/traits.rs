//! The [`Handler`] trait and its blanket implementations.
//!
//! Terminal handlers are plain async functions. Each argument is pulled out of
//! the [`Request`] with [`FromRequest`], in order, and the return value is
//! turned into an [`Outcome`] with [`IntoOutcome`]:
//!
//! ```rust,ignore
//! use frack_framework::prelude::*;
//!
//! // The whole request
//! async fn hello(_req: Request) -> &'static str {
//!     "Hello!"
//! }
//!
//! // Individual parts
//! async fn echo(method: Method, Path(path): Path, body: Bytes) -> String {
//!     format!("{method} {path}: {} bytes", body.len())
//! }
//!
//! // Fallible
//! async fn cars() -> Result<Json<Vec<Car>>, Failure> {
//!     Ok(Json(load_cars().await?))
//! }
//! ```

use std::future::Future;

use async_trait::async_trait;
use frack_core::{Outcome, Request};

use super::service::IntoOutcome;
use crate::extractor::FromRequest;

/// A terminal handler: turns one [`Request`] into one [`Outcome`].
///
/// Implemented for async functions taking 0-8 [`FromRequest`] arguments and
/// returning an [`IntoOutcome`] value. The type parameter `T` only serves to
/// keep the blanket implementations apart.
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Runs the handler for one request.
    async fn call(self, req: Request) -> Outcome;
}

/// Generates [`Handler`] implementations for functions of a given arity.
macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: IntoOutcome + 'static,
            $( $ty: FromRequest + Send + 'static, )*
        {
            async fn call(self, mut req: Request) -> Outcome {
                $(
                    let $ty = $ty::from_request(&mut req).await?;
                )*

                (self)($($ty,)*).await.into_outcome()
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
