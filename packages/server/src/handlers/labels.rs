use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::labels::{
    CreateLabelRequest, LabelDetailResponse, LabelListQuery, LabelListResponse, LabelResponse,
    UpdateLabelRequest,
};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Labels",
    operation_id = "createLabel",
    summary = "Create a label",
    request_body = CreateLabelRequest,
    responses(
        (status = 201, description = "Label created", body = LabelResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn create_label(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateLabelRequest>,
) -> Result<impl IntoResponse, AppError> {
    let label = state.labels.create(auth_user.user_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(LabelResponse::from(label))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Labels",
    operation_id = "listLabels",
    summary = "List the caller's labels",
    description = "With `file_id`, only labels that reference that file.",
    params(LabelListQuery),
    responses(
        (status = 200, description = "Label list", body = LabelListResponse),
        (status = 400, description = "Malformed query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_labels(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LabelListQuery>,
) -> Result<Json<LabelListResponse>, AppError> {
    let labels = state.labels.list(auth_user.user_id, query.file_id).await?;
    Ok(Json(LabelListResponse {
        data: labels.into_iter().map(LabelResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Labels",
    operation_id = "getLabel",
    summary = "Get a label with its files",
    description = "File references are listed in link order. A reference to a deleted or \
        unreadable file is kept with `file: null`.",
    params(("id" = Uuid, Path, description = "Label ID")),
    responses(
        (status = 200, description = "Label", body = LabelDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Label not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, label_id = %id))]
pub async fn get_label(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LabelDetailResponse>, AppError> {
    let label = state.labels.get(auth_user.user_id, id).await?;
    let resolved = state.labels.resolve(auth_user.user_id, label).await?;
    Ok(Json(resolved.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Labels",
    operation_id = "updateLabel",
    summary = "Rename or recolor a label",
    params(("id" = Uuid, Path, description = "Label ID")),
    request_body = UpdateLabelRequest,
    responses(
        (status = 200, description = "Updated label", body = LabelResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Label not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, label_id = %id))]
pub async fn update_label(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateLabelRequest>,
) -> Result<Json<LabelResponse>, AppError> {
    let label = state
        .labels
        .update(auth_user.user_id, id, payload.into())
        .await?;
    Ok(Json(label.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Labels",
    operation_id = "deleteLabel",
    summary = "Delete a label",
    description = "The labelled files are not affected.",
    params(("id" = Uuid, Path, description = "Label ID")),
    responses(
        (status = 204, description = "Label deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Label not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, label_id = %id))]
pub async fn delete_label(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.labels.delete(auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/files/{file_id}",
    tag = "Labels",
    operation_id = "linkLabelFile",
    summary = "Attach a file to a label",
    description = "Label owner only. The file must exist; files the owner cannot read \
        are shown as `null` when the label is fetched. Linking the same file again adds \
        another reference.",
    params(
        ("id" = Uuid, Path, description = "Label ID"),
        ("file_id" = Uuid, Path, description = "File ID"),
    ),
    responses(
        (status = 204, description = "File linked"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Label or file not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, label_id = %id, file_id = %file_id))]
pub async fn link_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, file_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state
        .labels
        .link_file(auth_user.user_id, id, file_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
