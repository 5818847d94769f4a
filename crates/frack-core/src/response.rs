//! Status lines and responses.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use thiserror::Error;

use crate::body::Body;

// =============================================================================
// Status
// =============================================================================

/// A response status line: numeric code plus reason phrase.
///
/// Displays as the classic status line text, e.g. `"200 OK"`. When no custom
/// reason is given, the canonical phrase for the code is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: StatusCode,
    reason: Option<Cow<'static, str>>,
}

/// Returned when a status line cannot be parsed.
#[derive(Debug, Clone, Error)]
#[error("invalid status line: {0:?}")]
pub struct InvalidStatus(String);

impl Status {
    pub const OK: Status = Status::from_code(StatusCode::OK);
    pub const NOT_FOUND: Status = Status::from_code(StatusCode::NOT_FOUND);
    pub const INTERNAL_SERVER_ERROR: Status = Status::from_code(StatusCode::INTERNAL_SERVER_ERROR);

    const fn from_code(code: StatusCode) -> Self {
        Self { code, reason: None }
    }

    /// Creates a status with the canonical reason phrase.
    pub fn new(code: StatusCode) -> Self {
        Self::from_code(code)
    }

    /// Replaces the reason phrase.
    pub fn with_reason(mut self, reason: impl Into<Cow<'static, str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Parses a status line such as `"200 OK"` or `"404"`.
    pub fn parse(line: &str) -> Result<Self, InvalidStatus> {
        let line = line.trim();
        let (code, reason) = match line.split_once(' ') {
            Some((code, reason)) => (code, reason.trim()),
            None => (line, ""),
        };
        let code = StatusCode::from_bytes(code.as_bytes())
            .map_err(|_| InvalidStatus(line.to_string()))?;

        let status = Self::new(code);
        if reason.is_empty() || code.canonical_reason() == Some(reason) {
            Ok(status)
        } else {
            Ok(status.with_reason(reason.to_string()))
        }
    }

    /// The numeric status code.
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// The reason phrase; empty for codes without a canonical phrase.
    pub fn reason(&self) -> &str {
        match &self.reason {
            Some(reason) => reason.as_ref(),
            None => self.code.canonical_reason().unwrap_or(""),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::OK
    }
}

impl From<StatusCode> for Status {
    fn from(code: StatusCode) -> Self {
        Self::new(code)
    }
}

impl FromStr for Status {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = self.reason();
        if reason.is_empty() {
            write!(f, "{}", self.code.as_u16())
        } else {
            write!(f, "{} {}", self.code.as_u16(), reason)
        }
    }
}

// =============================================================================
// Response
// =============================================================================

/// A response produced by a handler.
///
/// Headers may repeat: use [`HeaderMap::append`] (or [`Response::with_header`])
/// to add a further value under an existing name.
#[derive(Debug, Default)]
pub struct Response {
    status: Status,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    /// Creates a response with the given status, no headers and an empty body.
    pub fn new(status: impl Into<Status>) -> Self {
        Self {
            status: status.into(),
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }

    /// Shorthand for a `200 OK` response with the given body.
    pub fn ok(body: impl Into<Body>) -> Self {
        Self::new(Status::OK).with_body(body)
    }

    /// Reassembles a response from its parts.
    pub fn from_parts(status: Status, headers: HeaderMap, body: Body) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Appends a header value, keeping any values already present.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces the body.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut Status {
        &mut self.status
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

    /// Drops the body, leaving status and headers untouched.
    ///
    /// `Content-Length` is kept as-is: a HEAD response advertises the length
    /// the equivalent GET would have sent.
    pub fn strip_body(&mut self) {
        self.body = Body::empty();
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    pub fn into_parts(self) -> (Status, HeaderMap, Body) {
        (self.status, self.headers, self.body)
    }

    /// Converts into an `http::Response` for handing to a host server.
    ///
    /// A custom reason phrase cannot be represented by `http` and is dropped.
    pub fn into_http(self) -> http::Response<Body> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status.code();
        *response.headers_mut() = self.headers;
        response
    }
}

impl From<http::Response<Body>> for Response {
    fn from(response: http::Response<Body>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: Status::new(parts.status),
            headers: parts.headers,
            body,
        }
    }
}
