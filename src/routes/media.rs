use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::media::{DeleteMediaRequest, MediaListResponse, UploadParams, UploadResponse},
    error::AppError,
    routes::session::CurrentSession,
    services::media_service,
    state::SharedState,
};

/// Raw uploads are decoded in memory before shrinking.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Media screen routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/matches/{id}/media",
            get(list_media).post(upload_media).delete(delete_media),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Attachments of a match, read fresh from the media sheet.
#[utoipa::path(
    get,
    path = "/matches/{id}/media",
    tag = "media",
    params(
        ("x-session-token" = String, Header, description = "Token returned by /session/login"),
        ("id" = u32, Path, description = "Match identifier")
    ),
    responses((status = 200, description = "Attachments", body = MediaListResponse))
)]
/// Attachments of a match.
pub async fn list_media(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<u32>,
) -> Result<Json<MediaListResponse>, AppError> {
    Ok(Json(media_service::list(&state, &current.handle, id).await?))
}

/// Upload a file as the raw request body.
#[utoipa::path(
    post,
    path = "/matches/{id}/media",
    tag = "media",
    params(
        ("x-session-token" = String, Header, description = "Token returned by /session/login"),
        ("id" = u32, Path, description = "Match identifier"),
        UploadParams
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Attachment stored", body = UploadResponse),
        (status = 422, description = "Image still over budget; nothing stored", body = UploadResponse),
        (status = 413, description = "Non-image file over budget")
    )
)]
/// Upload one file as the raw request body.
pub async fn upload_media(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<u32>,
    Valid(Query(params)): Valid<Query<UploadParams>>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let outcome = media_service::upload(
        &state,
        &current.handle,
        id,
        params.filename,
        body.to_vec(),
        params.force,
    )
    .await?;
    let status = match &outcome {
        UploadResponse::Stored { .. } => StatusCode::CREATED,
        UploadResponse::Oversize { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    Ok((status, Json(outcome)))
}

/// Delete the first attachment of the match carrying exactly this payload.
#[utoipa::path(
    delete,
    path = "/matches/{id}/media",
    tag = "media",
    params(
        ("x-session-token" = String, Header, description = "Token returned by /session/login"),
        ("id" = u32, Path, description = "Match identifier")
    ),
    request_body = DeleteMediaRequest,
    responses(
        (status = 204, description = "Attachment deleted"),
        (status = 404, description = "No attachment with this payload")
    )
)]
/// Delete an attachment by its payload.
pub async fn delete_media(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<u32>,
    Valid(Json(payload)): Valid<Json<DeleteMediaRequest>>,
) -> Result<StatusCode, AppError> {
    media_service::delete(&state, &current.handle, id, &payload.encoded_payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
