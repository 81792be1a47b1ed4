use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit of independent loading/error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Trending,
    Popular,
    Detail,
    Search,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trending => write!(f, "trending"),
            Self::Popular => write!(f, "popular"),
            Self::Detail => write!(f, "detail"),
            Self::Search => write!(f, "search"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Loading/error state plus the last successfully fetched data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: T,
    pub error_message: Option<String>,
    /// When `data` was last replaced by a successful fetch.
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Ready and fetched within `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        if self.status != QueryStatus::Ready {
            return false;
        }
        let Some(updated_at) = self.updated_at else {
            return false;
        };
        let age = Utc::now().signed_duration_since(updated_at);
        age.to_std().map(|age| age < ttl).unwrap_or(true)
    }
}
