use std::path::PathBuf;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::storage::BoxReader;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::files::{FileListQuery, FileListResponse, FileResponse, UpdateFileRequest};
use crate::records::FileRecord;
use crate::services::{NewFile, UserDirectory};
use crate::state::AppState;
use crate::utils::filename::content_disposition_value;

/// Multipart framing allowance on top of the configured blob size.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

pub fn upload_body_limit(max_blob_size: u64) -> DefaultBodyLimit {
    let limit = max_blob_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

/// Render `file` with owner and contributor usernames filled in.
pub(crate) async fn file_response(
    state: &AppState,
    file: FileRecord,
) -> Result<FileResponse, AppError> {
    let users = UserDirectory::for_files(&*state.users, std::slice::from_ref(&file)).await?;
    Ok(FileResponse::build(file, &users))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Uploads a file owned by the caller. The `file` multipart field is required; \
        its filename becomes the file's name and its declared content type is kept \
        (guessed from the filename when absent). An optional `description` text field \
        may accompany it.",
    request_body(content_type = "multipart/form-data", description = "File upload with optional description"),
    responses(
        (status = 201, description = "File created", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Blob store failure (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn upload_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut staged: Option<StagedUpload> = None;
    let result = receive_upload(&auth_user, &state, &mut multipart, &mut staged).await;

    if let Some(staged) = staged {
        // Best effort.
        let _ = tokio::fs::remove_file(&staged.path).await;
    }

    let file = result?;
    Ok((StatusCode::CREATED, Json(file_response(&state, file).await?)))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List files visible to the caller",
    description = "`owned` lists files the caller owns, `shared` files where the caller is a \
        contributor, `accessible` both. Ordered by creation.",
    params(FileListQuery),
    responses(
        (status = 200, description = "File list", body = FileListResponse),
        (status = 400, description = "Unknown scope (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FileListQuery>,
) -> Result<Json<FileListResponse>, AppError> {
    let files = state.files.list(auth_user.user_id, query.scope).await?;
    let users = UserDirectory::for_files(&*state.users, &files).await?;

    let total = files.len() as u64;
    let data = files
        .into_iter()
        .map(|f| FileResponse::build(f, &users))
        .collect();

    Ok(Json(FileListResponse { data, total }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get file metadata",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File", body = FileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner or a contributor (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, file_id = %id))]
pub async fn get_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FileResponse>, AppError> {
    let file = state.files.get(auth_user.user_id, id).await?;
    Ok(Json(file_response(&state, file).await?))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Files",
    operation_id = "updateFile",
    summary = "Edit file metadata",
    description = "Allowed for the owner and read-write contributors. Only `name` and \
        `description` change; ownership cannot be transferred.",
    params(("id" = Uuid, Path, description = "File ID")),
    request_body = UpdateFileRequest,
    responses(
        (status = 200, description = "Updated file", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, file_id = %id))]
pub async fn update_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateFileRequest>,
) -> Result<Json<FileResponse>, AppError> {
    let file = state
        .files
        .update_metadata(auth_user.user_id, id, payload.into())
        .await?;
    Ok(Json(file_response(&state, file).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Owner only. The stored bytes are removed first; if the blob store fails \
        the metadata is kept and the request can be retried.",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Blob store failure (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, file_id = %id))]
pub async fn delete_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.files.delete(auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download file contents",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File bytes, streamed with the stored content type"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Blob store failure (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, file_id = %id))]
pub async fn download_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let (file, reader) = state.files.open_download(auth_user.user_id, id).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &file.content_type)
        .header(header::CONTENT_LENGTH, file.size.to_string())
        .header(header::CONTENT_DISPOSITION, content_disposition_value(&file.name))
        .header(header::CACHE_CONTROL, "private, no-cache")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Upload bytes spooled to disk while the remaining multipart fields arrive.
struct StagedUpload {
    path: PathBuf,
    filename: Option<String>,
    content_type: Option<String>,
    size: i64,
}

async fn receive_upload(
    auth_user: &AuthUser,
    state: &AppState,
    multipart: &mut Multipart,
    staged: &mut Option<StagedUpload>,
) -> Result<FileRecord, AppError> {
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") if staged.is_none() => {
                *staged = Some(stage_field(field, state.config.storage.max_blob_size).await?);
            }
            Some("file") => {
                return Err(AppError::Validation("Only one 'file' field is allowed".into()));
            }
            Some("description") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read description: {e}")))?;
                description = Some(text);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let upload = staged
        .as_ref()
        .ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let name = upload
        .filename
        .clone()
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;

    let file = tokio::fs::File::open(&upload.path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
    let reader: BoxReader = Box::new(file);

    state
        .files
        .create(
            auth_user.user_id,
            NewFile {
                name,
                content_type: upload.content_type.clone(),
                description,
                size: upload.size,
                reader,
            },
        )
        .await
}

/// Spool a multipart field to a temp file, enforcing `max_size`.
async fn stage_field(
    mut field: axum::extract::multipart::Field<'_>,
    max_size: u64,
) -> Result<StagedUpload, AppError> {
    let path = std::env::temp_dir().join(format!("sharebox-upload-{}", Uuid::new_v4()));
    let filename = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);

    let result = async {
        let mut temp_file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

        Ok(i64::try_from(total_size).unwrap_or(i64::MAX))
    }
    .await;

    match result {
        Ok(size) => Ok(StagedUpload {
            path,
            filename,
            content_type,
            size,
        }),
        Err(e) => {
            // Best effort.
            let _ = tokio::fs::remove_file(&path).await;
            Err(e)
        }
    }
}
