use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::UserRecord;

pub const DEFAULT_SEARCH_LIMIT: u64 = 20;
pub const MAX_SEARCH_LIMIT: u64 = 50;

/// Query parameters for looking up collaborators.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct UserSearchQuery {
    /// Case-insensitive substring of the username.
    #[param(example = "ali")]
    pub search: Option<String>,
    /// Maximum number of results (1-50, default 20).
    #[param(example = 20)]
    pub limit: Option<u64>,
}

impl UserSearchQuery {
    pub fn clamped_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT)
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    #[schema(example = "alice_wonder")]
    pub username: String,
}

impl From<UserRecord> for UserSummary {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserSummary>,
}
