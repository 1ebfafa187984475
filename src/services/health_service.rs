use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Check the workbook and report whether engine operations can reach it.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_sheet_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let sessions = state.session_count();
    if state.is_degraded() {
        HealthResponse::degraded(sessions)
    } else {
        HealthResponse::ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::{AppConfig, Credentials},
        dao::sheet_store::memory::MemorySheetStore,
        state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default(), Credentials::new("a", "b"));
        assert_eq!(health_status(&state).await.status, "degraded");

        state.set_sheet_store(Arc::new(MemorySheetStore::new())).await;
        state.open_session();
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.sessions, 1);
    }
}
