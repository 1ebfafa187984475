//! Background task owning the workbook connection.
//!
//! It connects, creates the missing sheets, then polls health. A failed health
//! check puts the state in degraded mode while a bounded number of reconnects
//! is tried; when they are exhausted the handle is dropped and the task starts
//! over from a fresh connection.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    dao::{sheet_store::SheetStore, sheets::prepare_workbook, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Keep a prepared workbook installed in `state` for as long as the process runs.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn SheetStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match open_workbook(&state, &mut connect).await {
            Ok(store) => {
                state.set_sheet_store(store.clone()).await;
                info!("workbook connected and prepared; leaving degraded mode");
                delay = INITIAL_DELAY;

                watch(&state, store.as_ref()).await;
                warn!("workbook unreachable after {MAX_RECONNECT_ATTEMPTS} reconnects; dropping the handle");
                state.clear_sheet_store().await;
            }
            Err(err) => {
                warn!(error = %err, retry_in = ?delay, "workbook connection failed");
            }
        }

        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

async fn open_workbook<F, Fut>(
    state: &SharedState,
    connect: &mut F,
) -> Result<Arc<dyn SheetStore>, StorageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Arc<dyn SheetStore>, StorageError>>,
{
    let store = connect().await?;
    prepare_workbook(store.as_ref(), &state.config().sheets).await?;
    Ok(store)
}

/// Poll health until the workbook is lost for good.
async fn watch(state: &SharedState, store: &dyn SheetStore) {
    loop {
        match store.health_check().await {
            Ok(()) => debug!("workbook health check passed"),
            Err(err) => {
                warn!(error = %err, "workbook health check failed; entering degraded mode");
                state.update_degraded(true);
                if !recover(state, store).await {
                    return;
                }
                info!("workbook reachable again; leaving degraded mode");
                state.update_degraded(false);
            }
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// Reconnect with backoff, re-creating any sheet that vanished during the outage.
async fn recover(state: &SharedState, store: &dyn SheetStore) -> bool {
    let mut delay = INITIAL_DELAY;
    for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
        let outcome = match store.try_reconnect().await {
            Ok(()) => prepare_workbook(store, &state.config().sheets).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(()) => return true,
            Err(err) => warn!(attempt, error = %err, "workbook reconnect attempt failed"),
        }
        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
    false
}
