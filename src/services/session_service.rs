//! Login, logout and the navigation state of a session.

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::session::{LoginRequest, LoginResponse, ScreenResponse},
    error::ServiceError,
    state::{SessionHandle, SharedState, navigation::NavigationEvent},
};

/// Check the shared credentials and open a session.
pub fn login(state: &SharedState, request: &LoginRequest) -> Result<LoginResponse, ServiceError> {
    if !state
        .credentials()
        .matches(&request.login_id, &request.password)
    {
        warn!(login_id = %request.login_id, "rejected login attempt");
        return Err(ServiceError::Unauthorized("invalid id or password".into()));
    }

    let token = state.open_session();
    info!(%token, "session opened");
    Ok(LoginResponse { token })
}

/// Forget the session registered under `token`.
pub fn logout(state: &SharedState, token: Uuid) {
    if state.close_session(token) {
        info!(%token, "session closed");
    }
}

/// Screen `session` is on.
pub async fn screen(session: &SessionHandle) -> ScreenResponse {
    let session = session.lock().await;
    session.navigation.snapshot().into()
}

/// Return from the detail or media screen to the list.
pub async fn back(session: &SessionHandle) -> Result<ScreenResponse, ServiceError> {
    let mut session = session.lock().await;
    session.navigation.transition(NavigationEvent::Back)?;
    Ok(session.navigation.snapshot().into())
}
