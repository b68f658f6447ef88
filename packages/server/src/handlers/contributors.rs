use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use super::files::file_response;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::files::{AddContributorRequest, FileResponse, UpdateContributorRequest};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Contributors",
    operation_id = "addContributor",
    summary = "Share a file with another user",
    description = "Owner only. `permission_level` defaults to `read_only`. Adding the same \
        user twice creates a second entry; the stronger level applies.",
    params(("id" = Uuid, Path, description = "File ID")),
    request_body = AddContributorRequest,
    responses(
        (status = 201, description = "Contributor added; returns the file", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, file_id = %file_id))]
pub async fn add_contributor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
    AppJson(payload): AppJson<AddContributorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (file, _) = state
        .contributors
        .add(
            auth_user.user_id,
            file_id,
            payload.user_id,
            payload.permission_level,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(file_response(&state, file).await?)))
}

#[utoipa::path(
    patch,
    path = "/{contributor_id}",
    tag = "Contributors",
    operation_id = "updateContributor",
    summary = "Change a contributor's permission level",
    params(
        ("id" = Uuid, Path, description = "File ID"),
        ("contributor_id" = Uuid, Path, description = "Contributor entry ID"),
    ),
    request_body = UpdateContributorRequest,
    responses(
        (status = 200, description = "Updated file", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File or contributor not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, file_id = %file_id, contributor_id = %contributor_id))]
pub async fn update_contributor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((file_id, contributor_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<UpdateContributorRequest>,
) -> Result<Json<FileResponse>, AppError> {
    let file = state
        .contributors
        .update(
            auth_user.user_id,
            file_id,
            contributor_id,
            payload.permission_level,
        )
        .await?;

    Ok(Json(file_response(&state, file).await?))
}

#[utoipa::path(
    delete,
    path = "/{contributor_id}",
    tag = "Contributors",
    operation_id = "removeContributor",
    summary = "Revoke a contributor's access",
    params(
        ("id" = Uuid, Path, description = "File ID"),
        ("contributor_id" = Uuid, Path, description = "Contributor entry ID"),
    ),
    responses(
        (status = 200, description = "Updated file", body = FileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File or contributor not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, file_id = %file_id, contributor_id = %contributor_id))]
pub async fn remove_contributor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((file_id, contributor_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<FileResponse>, AppError> {
    let file = state
        .contributors
        .remove(auth_user.user_id, file_id, contributor_id)
        .await?;

    Ok(Json(file_response(&state, file).await?))
}
