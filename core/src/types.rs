//! Domain DTOs for the items API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Server-assigned fields (`id`, `created_at`, `updated_at`) are kept as the
//! opaque strings the server sent; the client never builds an `Item` other
//! than by decoding a response, so nothing here can fabricate them.
//! Integration tests catch any schema drift between the two crates.

use serde::{Deserialize, Serialize};

/// A persisted item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request payload for creating a new item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemCreate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Envelope returned by the list endpoint. `total` is informational only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemListResponse {
    pub items: Vec<Item>,
    pub total: u64,
}

impl ItemListResponse {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
