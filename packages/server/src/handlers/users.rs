use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::AppQuery;
use crate::models::users::{UserListResponse, UserSearchQuery, UserSummary};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "searchUsers",
    summary = "Find users by partial username",
    description = "Case-insensitive substring match, ordered by username. \
        Used to pick collaborators when sharing a file.",
    params(UserSearchQuery),
    responses(
        (status = 200, description = "Matching users", body = UserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn search_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserSearchQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    let term = query.search.as_deref().map(str::trim).unwrap_or_default();
    let users = state.users.search_users(term, query.clamped_limit()).await?;

    Ok(Json(UserListResponse {
        data: users.into_iter().map(UserSummary::from).collect(),
    }))
}
