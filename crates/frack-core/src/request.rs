//! Inbound requests.

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use tokio_util::sync::CancellationToken;

use crate::body::Body;

/// An inbound call as seen by the pipeline.
///
/// Owned by the pipeline for the duration of one invocation. Middleware may
/// rewrite parts of it (the HEAD filter swaps the method, the timeout stage
/// installs a child cancellation token) before handing it inward.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Body,
    cancellation: CancellationToken,
}

impl Default for Request {
    fn default() -> Self {
        Self::new(Method::GET, "/")
    }
}

impl Request {
    /// Creates a request with no headers and an empty body.
    ///
    /// A `?query` suffix on `target` is split off into [`Request::query`].
    pub fn new(method: Method, target: impl AsRef<str>) -> Self {
        let (path, query) = split_target(target.as_ref());
        Self {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            body: Body::empty(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Starts building a request.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn method_mut(&mut self) -> &mut Method {
        &mut self.method
    }

    /// The target path, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Takes the body out, leaving an empty one in its place.
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    /// The token that signals this request has been abandoned.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Replaces the cancellation token seen by inner stages.
    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = token;
    }
}

impl From<http::Request<Body>> for Request {
    fn from(request: http::Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
            cancellation: CancellationToken::new(),
        }
    }
}

fn split_target(target: &str) -> (String, Option<String>) {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (target, None),
    };
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    (path, query)
}

// =============================================================================
// RequestBuilder
// =============================================================================

/// Builder for [`Request`].
///
/// Invalid header names or values are remembered and reported by
/// [`RequestBuilder::build`], so calls can be chained freely.
#[derive(Debug)]
pub struct RequestBuilder {
    inner: Result<Request, http::Error>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            inner: Ok(Request::default()),
        }
    }

    pub fn method(self, method: Method) -> Self {
        self.and_then(|mut req| {
            req.method = method;
            Ok(req)
        })
    }

    /// Sets the target path; a `?query` suffix becomes the query string.
    pub fn target(self, target: impl AsRef<str>) -> Self {
        let (path, query) = split_target(target.as_ref());
        self.and_then(|mut req| {
            req.path = path;
            req.query = query;
            Ok(req)
        })
    }

    /// Appends a header value.
    pub fn header<K, V>(self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: Into<http::Error>,
        V: TryInto<HeaderValue>,
        V::Error: Into<http::Error>,
    {
        self.and_then(|mut req| {
            let name = name.try_into().map_err(Into::into)?;
            let value = value.try_into().map_err(Into::into)?;
            req.headers.append(name, value);
            Ok(req)
        })
    }

    pub fn body(self, body: impl Into<Body>) -> Self {
        let body = body.into();
        self.and_then(|mut req| {
            req.body = body;
            Ok(req)
        })
    }

    pub fn cancellation(self, token: CancellationToken) -> Self {
        self.and_then(|mut req| {
            req.cancellation = token;
            Ok(req)
        })
    }

    /// Finishes the request, reporting the first invalid header, if any.
    pub fn build(self) -> Result<Request, http::Error> {
        self.inner
    }

    fn and_then<F>(self, f: F) -> Self
    where
        F: FnOnce(Request) -> Result<Request, http::Error>,
    {
        Self {
            inner: self.inner.and_then(f),
        }
    }
}
