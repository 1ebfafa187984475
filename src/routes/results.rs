use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use axum_valid::Valid;

use crate::{
    dto::results::{GameResultSlot, MatchResultsResponse, UpsertResultRequest},
    error::AppError,
    routes::session::CurrentSession,
    services::results_service,
    state::SharedState,
};

/// Detail screen routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches/{id}/results", get(get_results))
        .route("/matches/{id}/results/{game}", put(put_result))
}

/// Every game slot of a match, read fresh from the results blob.
#[utoipa::path(
    get,
    path = "/matches/{id}/results",
    tag = "results",
    params(
        ("x-session-token" = String, Header, description = "Token returned by /session/login"),
        ("id" = u32, Path, description = "Match identifier")
    ),
    responses((status = 200, description = "Game results", body = MatchResultsResponse))
)]
/// Every game slot of a match.
pub async fn get_results(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<u32>,
) -> Result<Json<MatchResultsResponse>, AppError> {
    Ok(Json(
        results_service::load(&state, &current.handle, id).await?,
    ))
}

/// Save one game; other entries of the blob are preserved.
#[utoipa::path(
    put,
    path = "/matches/{id}/results/{game}",
    tag = "results",
    params(
        ("x-session-token" = String, Header, description = "Token returned by /session/login"),
        ("id" = u32, Path, description = "Match identifier"),
        ("game" = u32, Path, description = "One-based game number")
    ),
    request_body = UpsertResultRequest,
    responses(
        (status = 200, description = "Saved game", body = GameResultSlot),
        (status = 400, description = "Game number out of range")
    )
)]
/// Save the result of one game.
pub async fn put_result(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentSession>,
    Path((id, game)): Path<(u32, u32)>,
    Valid(Json(payload)): Valid<Json<UpsertResultRequest>>,
) -> Result<Json<GameResultSlot>, AppError> {
    Ok(Json(
        results_service::upsert(&state, &current.handle, id, game, payload).await?,
    ))
}
