//! Response body buffering.

use std::task::{Context, Poll};

use frack_core::{Body, Failure, Outcome, Request, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::debug;

/// Reads a streamed response body to the end before handing the response on.
///
/// An error raised by the body stream surfaces as a [`Failure`] from this
/// stage instead of halfway through the caller's read. Bodies that are
/// already in memory pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferLayer;

impl<S> Layer<S> for BufferLayer {
    type Service = Buffer<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Buffer { inner }
    }
}

/// The [`Service`] produced by [`BufferLayer`].
#[derive(Debug, Clone)]
pub struct Buffer<S> {
    inner: S,
}

impl<S> Service<Request> for Buffer<S>
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
        let response = self.inner.call(req);
        Box::pin(async move {
            let response = response.await?;
            if !response.body().is_streaming() {
                return Ok(response);
            }

            let (status, headers, body) = response.into_parts();
            let chunks = body.into_chunks().await.inspect_err(|e| {
                debug!(error = %e, "Response body stream failed");
            })?;
            Ok(Response::from_parts(status, headers, Body::from_chunks(chunks)))
        })
    }
}

#[cfg(test)]
mod tests {
    use frack_core::{Bytes, Status};
    use futures::stream;
    use tokio_test::{assert_err, assert_ok};
    use tower::{ServiceExt, service_fn};

    use super::*;

    #[tokio::test]
    async fn test_stream_is_buffered() {
        let svc = BufferLayer.layer(service_fn(|_req: Request| async {
            let body = Body::from_stream(stream::iter(vec![
                Ok::<_, std::io::Error>(Bytes::from_static(b"one ")),
                Ok(Bytes::from_static(b"two")),
            ]));
            Ok::<_, Failure>(Response::new(Status::OK).with_body(body))
        }));

        let response = assert_ok!(svc.oneshot(Request::default()).await);
        assert!(!response.body().is_streaming());
        assert_eq!(response.body().content_length(), Some(7));
        let chunks = response.into_body().into_chunks().await.unwrap();
        assert_eq!(chunks, ["one ", "two"]);
    }

    #[tokio::test]
    async fn test_stream_error_becomes_failure() {
        let svc = BufferLayer.layer(service_fn(|_req: Request| async {
            let body = Body::from_stream(stream::iter(vec![
                Ok(Bytes::from_static(b"partial")),
                Err(std::io::Error::other("upstream closed")),
            ]));
            Ok::<_, Failure>(Response::new(Status::OK).with_body(body))
        }));

        let err = assert_err!(svc.oneshot(Request::default()).await);
        assert_eq!(err.to_string(), "handler failed: upstream closed");
    }
}
