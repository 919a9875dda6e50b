//! HTTP request builder and response parser for the items API.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`;
//! `request` glues the two around a `Transport`. Keeping the build and parse
//! halves pure makes status and header handling testable without a network.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ApiError, RequestError};
use crate::http::{HttpRequest, HttpResponse, RequestOptions, Transport};
use crate::types::{Item, ItemCreate, ItemListResponse};

/// Collection endpoint for items, relative to the base URL.
pub const ITEMS_PATH: &str = "/api/v1/items";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Stateless client for the items API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request for `path` relative to the base URL.
    ///
    /// `Content-Type: application/json` is always attached first; a caller
    /// header with the same name replaces it.
    pub fn build_request(&self, path: &str, options: &RequestOptions) -> HttpRequest {
        let mut headers = vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())];
        for (name, value) in &options.headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        HttpRequest {
            method: options.method,
            url: format!("{}{path}", self.base_url),
            headers,
            body: options.body.clone(),
        }
    }

    /// Decode a successful response body as `T`. The body is trusted; no
    /// schema checks beyond what deserialization itself requires.
    pub fn parse_response<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    /// Build, send and parse in one go. No retry happens here.
    pub async fn request<T, Tr>(
        &self,
        transport: &Tr,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        Tr: Transport,
    {
        let request = self.build_request(path, &options);
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = transport
            .send(request)
            .await
            .map_err(RequestError::Connectivity)?;
        debug!(status = response.status, "response status");
        Ok(self.parse_response(response)?)
    }

    pub fn build_list_items(&self) -> HttpRequest {
        self.build_request(ITEMS_PATH, &RequestOptions::default())
    }

    pub fn build_create_item(&self, input: &ItemCreate) -> Result<HttpRequest, ApiError> {
        Ok(self.build_request(ITEMS_PATH, &create_options(input)?))
    }

    pub fn parse_list_items(&self, response: HttpResponse) -> Result<ItemListResponse, ApiError> {
        self.parse_response(response)
    }

    pub fn parse_create_item(&self, response: HttpResponse) -> Result<Item, ApiError> {
        self.parse_response(response)
    }
}

pub(crate) fn create_options(input: &ItemCreate) -> Result<RequestOptions, ApiError> {
    let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
    Ok(RequestOptions::post(body))
}

/// Map non-success status codes to `ApiError::Status`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Status {
        status: response.status,
        status_text: response.status_text.clone(),
    })
}
