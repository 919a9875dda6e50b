//! Client-side data layer for the items API.
//!
//! # Overview
//! Builds requests, sends them through a pluggable `Transport`, parses the
//! responses, caches the item list, and exposes each operation as an
//! observable state machine that a UI or a headless test can assert against.
//!
//! # Design
//! - `ApiClient` is stateless: it holds only `base_url`. Each operation is
//!   split into `build_*` and `parse_*` so the I/O boundary is explicit.
//! - `QueryCache` is owned by the caller and passed in by shared reference; invalidation is an
//!   explicit call made after a successful create.
//! - `ItemsQuery`, `CreateItemMutation` and `CreateItemForm` publish their
//!   state through shared cells that stay readable while a request is in
//!   flight; `ListView` maps the list state to one rendering.
//! - Everything runs on one logical thread; futures need not be `Send`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod items;
pub mod state;
pub mod transport;
pub mod types;
pub mod view;

pub use cache::{QueryCache, QueryKey};
pub use client::{ApiClient, ITEMS_PATH};
pub use config::ApiConfig;
pub use error::{ApiError, ConfigError, RequestError, TransportError, ValidationError};
pub use form::{CreateItemForm, FormPhase, SubmitOutcome};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions, Transport};
pub use items::{CreateItemMutation, ItemsApi, ItemsQuery};
pub use state::{OperationState, QueryConfig, RetryPolicy, SharedState};
pub use transport::ReqwestTransport;
pub use types::{Item, ItemCreate, ItemListResponse};
pub use view::{ItemRow, ListView};
