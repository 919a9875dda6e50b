//! Typed item operations and their cache integration.
//!
//! # Design
//! `ItemsApi` is the thin binding from operations to `ApiClient::request`.
//! `ItemsQuery` and `CreateItemMutation` wrap those calls in a `SharedState`
//! that observers can read while the request runs, and talk to a
//! caller-owned `QueryCache`:
//! - the list read is served from the cache while its entry is fresh;
//! - a successful create invalidates the list entry, and only after the
//!   create's response has been observed.
//!
//! Each operation runs at most once at a time: a call made while one is in
//! flight issues no request and returns the current (pending) state.

use tracing::{debug, warn};

use crate::cache::{QueryCache, QueryKey};
use crate::client::{create_options, ApiClient, ITEMS_PATH};
use crate::error::RequestError;
use crate::http::{RequestOptions, Transport};
use crate::state::{OperationState, QueryConfig, RetryPolicy, SharedState};
use crate::types::{Item, ItemCreate, ItemListResponse};

/// Item endpoints bound to a client and a transport.
#[derive(Debug, Clone)]
pub struct ItemsApi<T> {
    client: ApiClient,
    transport: T,
}

impl<T: Transport> ItemsApi<T> {
    pub fn new(client: ApiClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `GET /api/v1/items`
    pub async fn list_items(&self) -> Result<ItemListResponse, RequestError> {
        self.client
            .request(&self.transport, ITEMS_PATH, RequestOptions::default())
            .await
    }

    /// `POST /api/v1/items`
    pub async fn create_item(&self, input: &ItemCreate) -> Result<Item, RequestError> {
        let options = create_options(input)?;
        self.client.request(&self.transport, ITEMS_PATH, options).await
    }
}

/// The item collection read.
#[derive(Debug)]
pub struct ItemsQuery {
    config: QueryConfig,
    state: SharedState<ItemListResponse>,
}

impl Default for ItemsQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemsQuery {
    pub const KEY: QueryKey = QueryKey::Items;

    /// Failures surface on the first attempt; connectivity problems should
    /// be visible right away rather than hidden behind retries.
    pub fn new() -> Self {
        Self::with_config(QueryConfig {
            retry: RetryPolicy::none(),
        })
    }

    pub fn with_config(config: QueryConfig) -> Self {
        Self {
            config,
            state: SharedState::new(),
        }
    }

    pub fn config(&self) -> QueryConfig {
        self.config
    }

    pub fn state(&self) -> OperationState<ItemListResponse> {
        self.state.get()
    }

    /// Handle for observing the read from elsewhere, including mid-flight.
    pub fn watch(&self) -> SharedState<ItemListResponse> {
        self.state.clone()
    }

    /// Read the collection, from the cache when its entry is fresh.
    pub async fn fetch<T: Transport>(
        &self,
        api: &ItemsApi<T>,
        cache: &QueryCache,
    ) -> OperationState<ItemListResponse> {
        if self.state.is_pending() {
            debug!("item list read already in flight");
            return self.state();
        }

        if let Some(cached) = cache.fresh::<ItemListResponse>(Self::KEY) {
            debug!(items = cached.items.len(), "serving item list from cache");
            self.state.update(|state| state.settle(Ok(cached)));
            return self.state();
        }

        let Some(flight) = self.state.start() else {
            return self.state();
        };
        let mut failed_attempts = 0;
        let result = loop {
            match api.list_items().await {
                Ok(list) => break Ok(list),
                Err(err) => {
                    failed_attempts += 1;
                    if !self.config.retry.should_retry(failed_attempts) {
                        break Err(err);
                    }
                    debug!(attempt = failed_attempts, error = %err, "retrying item list");
                }
            }
        };

        if let Ok(list) = &result {
            if let Err(err) = cache.store(Self::KEY, list) {
                warn!(error = %err, "item list not cached");
            }
        }
        flight.finish(result);
        debug!(state = self.state.label(), "item list settled");
        self.state()
    }
}

/// The create write. Never retried.
#[derive(Debug, Default)]
pub struct CreateItemMutation {
    state: SharedState<Item>,
}

impl CreateItemMutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OperationState<Item> {
        self.state.get()
    }

    pub fn watch(&self) -> SharedState<Item> {
        self.state.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    /// Create an item; on success, mark the cached item list stale.
    ///
    /// The list is not updated optimistically: the new item appears only
    /// once the next list read completes. While a create is in flight a
    /// further call sends nothing and returns the pending state.
    pub async fn mutate<T: Transport>(
        &self,
        api: &ItemsApi<T>,
        cache: &QueryCache,
        input: &ItemCreate,
    ) -> OperationState<Item> {
        let Some(flight) = self.state.start() else {
            debug!("create item already in flight");
            return self.state();
        };
        let result = api.create_item(input).await;
        if result.is_ok() {
            cache.invalidate(ItemsQuery::KEY);
        }
        flight.finish(result);
        debug!(state = self.state.label(), "create item settled");
        self.state()
    }

    pub fn reset(&self) {
        if !self.state.is_pending() {
            self.state.update(OperationState::reset);
        }
    }
}
