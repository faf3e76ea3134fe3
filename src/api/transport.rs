//! HTTP transport for the SI-PNI API.
//!
//! `HttpTransport` is the seam between the session logic and the network so
//! the session and query code can be exercised against a scripted transport
//! in tests. `ReqwestTransport` is the real blocking implementation.

use std::time::{Duration, Instant};

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, Url};
use thiserror::Error;

use super::error::{truncate_for_log, ApiError, ApiResult, MAX_LOG_BODY_LENGTH};

/// Failure of a single HTTP exchange, before any retry decision is made.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connected, but no complete response arrived within the timeout window.
    #[error("read timed out: {0}")]
    ReadTimeout(String),

    /// Anything else: refused connection, DNS failure, TLS error, broken body.
    #[error("{0}")]
    Network(String),

    /// A path segment that would be dropped or collapsed when building the URL.
    #[error("invalid path segment {0:?}")]
    InvalidPath(String),
}

impl TransportError {
    pub fn is_read_timeout(&self) -> bool {
        matches!(self, TransportError::ReadTimeout(_))
    }
}

/// A request relative to the transport's base URL.
///
/// The path is carried as raw segments; encoding happens when the transport
/// builds the final URL.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub headers: Vec<(&'static str, String)>,
}

impl HttpRequest {
    pub fn get<S: AsRef<str>>(segments: &[S]) -> Self {
        Self::new(Method::GET, segments)
    }

    pub fn post<S: AsRef<str>>(segments: &[S]) -> Self {
        Self::new(Method::POST, segments)
    }

    fn new<S: AsRef<str>>(method: Method, segments: &[S]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.as_ref().to_string()).collect(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Look up a header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Path relative to the base URL, for log output.
    pub fn display_path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for sending requests to the SI-PNI API, allowing for mocking in tests.
pub trait HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking `reqwest` transport bound to one base URL.
pub struct ReqwestTransport {
    base_url: Url,
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "base URL '{}' cannot carry a path",
                base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| ApiError::Config(format!("invalid user agent: {}", e)))?,
        );

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    /// Append percent-encoded path segments to the base URL.
    ///
    /// Empty, `.` and `..` segments are rejected: URL normalisation would
    /// remove them (even as `%2E`) and route the request elsewhere.
    pub fn url_for<S: AsRef<str>>(&self, segments: &[S]) -> Result<Url, TransportError> {
        if let Some(bad) = segments.iter().map(|s| s.as_ref()).find(|s| !is_routable_segment(s)) {
            return Err(TransportError::InvalidPath(bad.to_string()));
        }

        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new(), so this always succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments.iter().map(|s| s.as_ref()));
        }
        Ok(url)
    }
}

/// Whether a raw segment survives URL path normalisation as its own segment.
pub fn is_routable_segment(segment: &str) -> bool {
    !matches!(segment, "" | "." | "..")
}

fn classify(err: reqwest::Error) -> TransportError {
    // reqwest reports connect timeouts as both connect and timeout errors
    if err.is_timeout() && !err.is_connect() {
        TransportError::ReadTimeout(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(&request.segments)?;
        debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let start = Instant::now();
        let response = builder.send().map_err(|e| {
            debug!("  transport error after {:?}: {}", start.elapsed(), e);
            classify(e)
        })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| {
            debug!("  failed reading body after {:?}: {}", start.elapsed(), e);
            classify(e)
        })?;

        debug!("  response: {} in {:?} ({} bytes)", status, start.elapsed(), body.len());
        debug!("  response preview: {}", truncate_for_log(&body, MAX_LOG_BODY_LENGTH));

        Ok(HttpResponse { status, body })
    }
}
