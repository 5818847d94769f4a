//! Handler argument extraction.
//!
//! Each handler argument implements [`FromRequest`]. Extractors run in
//! argument order against the same request; the ones that consume the body
//! ([`Body`], [`Bytes`], `String`, [`Json`](crate::Json), [`Request`]) leave an
//! empty body behind, so they belong in the last position.

use async_trait::async_trait;
use frack_core::{Body, Bytes, CancellationToken, Failure, HeaderMap, Method, Request};

use crate::error::ExtractError;

/// Types that can be pulled out of a [`Request`] before a handler runs.
///
/// A failed extraction ends the invocation with the returned [`Failure`];
/// the handler itself is never called.
#[async_trait]
pub trait FromRequest: Sized {
    /// Extracts `Self` from the request.
    async fn from_request(req: &mut Request) -> Result<Self, Failure>;
}

/// The request path, without the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path(pub String);

/// The raw query string, if the target had one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query(pub Option<String>);

#[async_trait]
impl FromRequest for Method {
    async fn from_request(req: &mut Request) -> Result<Self, Failure> {
        Ok(req.method().clone())
    }
}

#[async_trait]
impl FromRequest for HeaderMap {
    async fn from_request(req: &mut Request) -> Result<Self, Failure> {
        Ok(req.headers().clone())
    }
}

#[async_trait]
impl FromRequest for Path {
    async fn from_request(req: &mut Request) -> Result<Self, Failure> {
        Ok(Path(req.path().to_string()))
    }
}

#[async_trait]
impl FromRequest for Query {
    async fn from_request(req: &mut Request) -> Result<Self, Failure> {
        Ok(Query(req.query().map(str::to_string)))
    }
}

/// The request's cancellation token, for handlers that want to stop early
/// on their own terms.
#[async_trait]
impl FromRequest for CancellationToken {
    async fn from_request(req: &mut Request) -> Result<Self, Failure> {
        Ok(req.cancellation().clone())
    }
}

#[async_trait]
impl FromRequest for Body {
    async fn from_request(req: &mut Request) -> Result<Self, Failure> {
        Ok(req.take_body())
    }
}

#[async_trait]
impl FromRequest for Bytes {
    async fn from_request(req: &mut Request) -> Result<Self, Failure> {
        req.take_body().to_bytes().await
    }
}

#[async_trait]
impl FromRequest for String {
    async fn from_request(req: &mut Request) -> Result<Self, Failure> {
        let bytes = req.take_body().to_bytes().await?;
        let text = String::from_utf8(bytes.to_vec()).map_err(ExtractError::InvalidUtf8)?;
        Ok(text)
    }
}

/// The whole request. Anything extracted before it has already been taken.
#[async_trait]
impl FromRequest for Request {
    async fn from_request(req: &mut Request) -> Result<Self, Failure> {
        Ok(std::mem::take(req))
    }
}
