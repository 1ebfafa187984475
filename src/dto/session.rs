use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::state::navigation::{Screen, Snapshot};

/// Shared login submitted from the login form.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    /// Shared login id.
    #[validate(length(min = 1, max = 128))]
    pub login_id: String,
    /// Shared password.
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Token identifying the session created by a successful login.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Send back in the `x-session-token` header.
    pub token: Uuid,
}

/// Kind of screen shown to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScreenKind {
    /// Match list.
    List,
    /// Per-game results of one match.
    Detail,
    /// Attachments of one match.
    Media,
}

/// Screen the session is currently on.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScreenResponse {
    /// Current screen.
    pub screen: ScreenKind,
    /// Match shown by the detail and media screens.
    pub match_id: Option<u32>,
    /// Incremented on every applied transition.
    pub version: usize,
}

impl From<Snapshot> for ScreenResponse {
    fn from(snapshot: Snapshot) -> Self {
        let screen = match snapshot.screen {
            Screen::List => ScreenKind::List,
            Screen::Detail(_) => ScreenKind::Detail,
            Screen::Media(_) => ScreenKind::Media,
        };
        Self {
            screen,
            match_id: snapshot.screen.match_id(),
            version: snapshot.version,
        }
    }
}
