use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const MAX_NAME_LEN: usize = 255;
pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(serialize_with = "rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "rfc3339")]
    pub updated_at: DateTime<Utc>,
}

fn rfc3339<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

#[derive(Deserialize)]
pub struct ItemCreate {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemListResponse {
    pub items: Vec<Item>,
    pub total: usize,
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT as i64
}

/// Items in insertion order.
pub type Db = Arc<RwLock<Vec<Item>>>;

/// Error body shaped as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn unprocessable(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.into(),
        }
    }

    fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(detail = %self.detail, "request failed");
        } else {
            tracing::debug!(status = self.status.as_u16(), detail = %self.detail, "request rejected");
        }
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn app() -> Router {
    app_with_db(Db::default())
}

pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/api/v1/items", get(list_items).post(create_item))
        .route("/api/v1/items/{id}", get(get_item))
        .route("/health/live", get(health_live))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_items(
    State(db): State<Db>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ItemListResponse>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::unprocessable(rejection.body_text()))?;
    if params.skip < 0 {
        return Err(ApiError::unprocessable("skip must be greater than or equal to 0"));
    }
    if params.limit < 1 || params.limit > MAX_LIMIT as i64 {
        return Err(ApiError::unprocessable(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    let items = db.read().await;
    let page = items
        .iter()
        .rev()
        .skip(params.skip as usize)
        .take(params.limit as usize)
        .cloned()
        .collect();
    Ok(Json(ItemListResponse {
        items: page,
        total: items.len(),
    }))
}

async fn create_item(
    State(db): State<Db>,
    payload: Result<Json<ItemCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let Json(input) = payload.map_err(|rejection| ApiError::unprocessable(rejection.body_text()))?;
    let name_len = input.name.chars().count();
    if name_len == 0 {
        return Err(ApiError::unprocessable("name must not be empty"));
    }
    if name_len > MAX_NAME_LEN {
        return Err(ApiError::unprocessable(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }

    let now = Utc::now();
    let item = Item {
        id: Uuid::new_v4(),
        name: input.name,
        description: input.description,
        created_at: now,
        updated_at: now,
    };
    db.write().await.push(item.clone());
    tracing::info!(id = %item.id, "item created");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, ApiError> {
    let items = db.read().await;
    items
        .iter()
        .find(|item| item.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Item {id} not found")))
}

async fn health_live() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
