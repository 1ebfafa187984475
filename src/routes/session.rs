use axum::{
    Extension, Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::session::{LoginRequest, LoginResponse, ScreenResponse},
    error::AppError,
    services::session_service,
    state::{SessionHandle, SharedState},
};

pub(crate) const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Session resolved from the `x-session-token` header by [`require_session`].
#[derive(Clone)]
pub struct CurrentSession {
    /// Token the session is registered under.
    pub token: Uuid,
    /// Shared session state.
    pub handle: SessionHandle,
}

/// Routes reachable without a session.
pub fn public_router() -> Router<SharedState> {
    Router::new().route("/session/login", post(login))
}

/// Routes operating on the caller's session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session/logout", post(logout))
        .route("/session/screen", get(screen))
        .route("/session/back", post(back))
}

/// Exchange the shared login for a session token.
#[utoipa::path(
    post,
    path = "/session/login",
    tag = "session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = LoginResponse),
        (status = 401, description = "Wrong id or password")
    )
)]
/// Open a session with the shared login.
pub async fn login(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LoginRequest>>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(session_service::login(&state, &payload)?))
}

/// Close the caller's session.
#[utoipa::path(
    post,
    path = "/session/logout",
    tag = "session",
    params(("x-session-token" = String, Header, description = "Token returned by /session/login")),
    responses((status = 204, description = "Session closed"))
)]
/// Close the calling session.
pub async fn logout(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentSession>,
) -> StatusCode {
    session_service::logout(&state, current.token);
    StatusCode::NO_CONTENT
}

/// Screen the session is currently on.
#[utoipa::path(
    get,
    path = "/session/screen",
    tag = "session",
    params(("x-session-token" = String, Header, description = "Token returned by /session/login")),
    responses((status = 200, description = "Current screen", body = ScreenResponse))
)]
/// Screen the calling session is on.
pub async fn screen(Extension(current): Extension<CurrentSession>) -> Json<ScreenResponse> {
    Json(session_service::screen(&current.handle).await)
}

/// Leave the detail or media screen.
#[utoipa::path(
    post,
    path = "/session/back",
    tag = "session",
    params(("x-session-token" = String, Header, description = "Token returned by /session/login")),
    responses(
        (status = 200, description = "Back on the list screen", body = ScreenResponse),
        (status = 409, description = "Already on the list screen")
    )
)]
/// Return to the list screen.
pub async fn back(
    Extension(current): Extension<CurrentSession>,
) -> Result<Json<ScreenResponse>, AppError> {
    Ok(Json(session_service::back(&current.handle).await?))
}

/// Resolve the session token header and expose the session to handlers.
pub async fn require_session(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(SESSION_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing session token header `x-session-token`".into())
        })?;

    let token = Uuid::parse_str(provided.trim())
        .map_err(|_| AppError::Unauthorized("malformed session token".into()))?;

    match state.session(token) {
        Some(handle) => {
            req.extensions_mut()
                .insert(CurrentSession { token, handle });
            Ok(next.run(req).await)
        }
        None => Err(AppError::Unauthorized("unknown or expired session".into())),
    }
}
