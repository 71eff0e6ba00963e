//! Request/response shapes the hooks read.

use axum::body::HttpBody;
use axum::http::{header::CONTENT_LENGTH, HeaderMap, Request, Response, StatusCode};

/// What the hooks need to know about a request.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub method: String,
    pub path: String,
    pub content_length: Option<u64>,
    /// Available to labelers; the hooks themselves ignore headers.
    pub headers: HeaderMap,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_content_length(mut self, len: u64) -> Self {
        self.content_length = Some(len);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Capture method, path, headers and size of an HTTP request.
    pub fn from_http<B: HttpBody>(req: &Request<B>) -> Self {
        Self {
            method: req.method().as_str().to_string(),
            path: req.uri().path().to_string(),
            content_length: declared_length(req.headers())
                .or_else(|| req.body().size_hint().exact()),
            headers: req.headers().clone(),
        }
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Anything the after-response hook can observe and pass through.
pub trait ObservedResponse {
    fn status_code(&self) -> u16;
    fn content_length(&self) -> Option<u64>;
}

impl<B: HttpBody> ObservedResponse for Response<B> {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    fn content_length(&self) -> Option<u64> {
        declared_length(self.headers()).or_else(|| self.body().size_hint().exact())
    }
}

/// Plain status + size pair, for hosts that are not `http`-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseInfo {
    pub status: u16,
    pub content_length: Option<u64>,
}

impl ResponseInfo {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status: status.as_u16(),
            content_length: None,
        }
    }

    pub fn with_content_length(mut self, len: u64) -> Self {
        self.content_length = Some(len);
        self
    }
}

impl ObservedResponse for ResponseInfo {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn content_length(&self) -> Option<u64> {
        self.content_length
    }
}
