//! Item list rendering.
//!
//! `ListView` is a pure function of the list read's state: exactly one of
//! loading, connection error, empty or populated.

use std::fmt;

use chrono::{DateTime, NaiveDateTime};

use crate::state::OperationState;
use crate::types::{Item, ItemListResponse};

/// Placeholder rows shown while the first load is in flight.
pub const LOADING_PLACEHOLDERS: usize = 3;

pub const CONNECTION_ERROR_TITLE: &str = "Could not connect to API";
pub const EMPTY_TITLE: &str = "No items yet";

const PLACEHOLDER_ROW: &str = "░░░░░░░░░░░░░░░░";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Human-readable creation date.
    pub created: String,
}

impl From<&Item> for ItemRow {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            description: item.description.clone().filter(|d| !d.is_empty()),
            created: format_date(&item.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Loading { placeholders: usize },
    ConnectionError { base_url: String, detail: String },
    Empty,
    Populated(Vec<ItemRow>),
}

impl ListView {
    /// Pick the rendering for `state`. A pending refetch that still holds
    /// earlier data shows that data; only a load with nothing to show is
    /// rendered as loading.
    pub fn from_state(state: &OperationState<ItemListResponse>, base_url: &str) -> Self {
        match state {
            OperationState::Idle | OperationState::Pending { previous: None } => ListView::Loading {
                placeholders: LOADING_PLACEHOLDERS,
            },
            OperationState::Error(err) => ListView::ConnectionError {
                base_url: base_url.to_string(),
                detail: err.to_string(),
            },
            OperationState::Pending { previous: Some(list) } | OperationState::Success(list) => {
                Self::from_list(list)
            }
        }
    }

    fn from_list(list: &ItemListResponse) -> Self {
        if list.is_empty() {
            ListView::Empty
        } else {
            ListView::Populated(list.items.iter().map(ItemRow::from).collect())
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListView::Loading { placeholders } => {
                for _ in 0..*placeholders {
                    writeln!(f, "{PLACEHOLDER_ROW}")?;
                }
            }
            ListView::ConnectionError { base_url, detail } => {
                writeln!(f, "{CONNECTION_ERROR_TITLE}")?;
                writeln!(f, "Could not reach the backend at {base_url}. Is the backend running?")?;
                writeln!(f, "({detail})")?;
                writeln!(f, "Start the backend:")?;
                writeln!(f, "  cd backend && make dev")?;
            }
            ListView::Empty => {
                writeln!(f, "{EMPTY_TITLE}")?;
                writeln!(f, "Use the form above to create your first item.")?;
            }
            ListView::Populated(rows) => {
                for row in rows {
                    writeln!(f, "{}", row.name)?;
                    if let Some(description) = &row.description {
                        writeln!(f, "  {description}")?;
                    }
                    writeln!(f, "  Created {}", row.created)?;
                }
            }
        }
        Ok(())
    }
}

/// `M/D/YYYY` for RFC 3339 or naive ISO-8601 timestamps; anything else is
/// returned unchanged.
pub fn format_date(timestamp: &str) -> String {
    const DISPLAY: &str = "%-m/%-d/%Y";
    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return parsed.format(DISPLAY).to_string();
    }
    match NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(parsed) => parsed.format(DISPLAY).to_string(),
        Err(_) => timestamp.to_string(),
    }
}
