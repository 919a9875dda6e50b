//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network. Whatever actually performs the round-trip sits
//! behind the `Transport` trait, so tests can substitute a stub and the
//! production path can use `ReqwestTransport`.
//!
//! All fields use owned types (`String`, `Vec`) so values can be recorded,
//! replayed and compared in tests without lifetime concerns.

use std::future::Future;

use crate::error::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `ApiClient::build_*` methods. A `Transport` executes it and
/// returns the corresponding `HttpResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// `status_text` is the reason phrase; transports that cannot see the wire
/// phrase fill in the canonical one for the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Caller-supplied request options. Defaults to a bodiless `GET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: HttpMethod::Get,
            body: None,
            headers: Vec::new(),
        }
    }
}

impl RequestOptions {
    pub fn post(body: String) -> Self {
        Self {
            method: HttpMethod::Post,
            body: Some(body),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Executes one HTTP round-trip.
///
/// A returned `Err` means the server was never reached or the exchange broke
/// off; any response the server did send, whatever its status, is `Ok`.
/// Futures are not required to be `Send`: everything runs on one logical
/// thread of control.
pub trait Transport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> {
        (**self).send(request)
    }
}
