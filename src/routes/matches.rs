use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::matches::{EditBatchRequest, EditBatchResponse, ListQuery, ListViewResponse, MatchSummary},
    error::AppError,
    routes::session::CurrentSession,
    services::list_service,
    state::SharedState,
};

/// List screen routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", get(list_matches))
        .route("/matches/edits", post(apply_edits))
        .route("/matches/{id}", get(get_match))
}

/// Compute the filtered view of the list and keep it as the target of the next edit batch.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    params(
        ("x-session-token" = String, Header, description = "Token returned by /session/login"),
        ListQuery
    ),
    responses((status = 200, description = "Filtered list", body = ListViewResponse))
)]
/// Filtered view of the match list.
pub async fn list_matches(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentSession>,
    Valid(Query(query)): Valid<Query<ListQuery>>,
) -> Result<Json<ListViewResponse>, AppError> {
    Ok(Json(
        list_service::list_view(&state, &current.handle, query).await?,
    ))
}

/// Apply grid edits addressed by view row; an action toggle switches screens.
#[utoipa::path(
    post,
    path = "/matches/edits",
    tag = "matches",
    params(("x-session-token" = String, Header, description = "Token returned by /session/login")),
    request_body = EditBatchRequest,
    responses(
        (status = 200, description = "Batch applied and saved", body = EditBatchResponse),
        (status = 400, description = "Row outside the view or invalid value"),
        (status = 409, description = "Not on the list screen or stale view"),
        (status = 503, description = "Workbook unreachable; edits kept in memory")
    )
)]
/// Apply an edit batch made on the last view.
pub async fn apply_edits(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentSession>,
    Valid(Json(payload)): Valid<Json<EditBatchRequest>>,
) -> Result<Json<EditBatchResponse>, AppError> {
    Ok(Json(
        list_service::apply_edits(&state, &current.handle, payload).await?,
    ))
}

/// Persisted columns of one match.
#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(
        ("x-session-token" = String, Header, description = "Token returned by /session/login"),
        ("id" = u32, Path, description = "Match identifier")
    ),
    responses((status = 200, description = "Match", body = MatchSummary))
)]
/// Persisted columns of one match.
pub async fn get_match(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<u32>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(
        list_service::require_match(&state, &current.handle, id).await?,
    ))
}
