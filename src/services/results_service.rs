//! Detail screen: per-game results of a match stored in the shared results blob.

use tracing::info;

use crate::{
    dao::{
        models::{ResultEntry, result_key},
        results::ResultBlobStore,
    },
    dto::results::{GameResultSlot, MatchResultsResponse, UpsertResultRequest},
    error::ServiceError,
    services::list_service,
    state::{SessionHandle, SharedState},
};

async fn blob_store(state: &SharedState) -> Result<ResultBlobStore, ServiceError> {
    let store = state.require_sheet_store().await?;
    Ok(ResultBlobStore::new(store, &state.config().sheets))
}

/// Every game slot of `match_id`, filled from the blob when an entry exists.
pub async fn load(
    state: &SharedState,
    session: &SessionHandle,
    match_id: u32,
) -> Result<MatchResultsResponse, ServiceError> {
    let mut session = session.lock().await;
    let record = list_service::loaded_match(state, &mut session, match_id).await?;
    let stored = blob_store(state).await?.load(match_id).await?;
    let games = (1..=state.config().game_slots)
        .map(|game| GameResultSlot::new(match_id, game, stored.get(&result_key(match_id, game))))
        .collect();
    Ok(MatchResultsResponse { record, games })
}

/// Save the score and scorers of one game.
///
/// The session stays locked from the match lookup to the blob write, so two
/// saves of the same session never interleave their read-modify-write.
pub async fn upsert(
    state: &SharedState,
    session: &SessionHandle,
    match_id: u32,
    game: u32,
    request: UpsertResultRequest,
) -> Result<GameResultSlot, ServiceError> {
    let slots = state.config().game_slots;
    if game == 0 || game > slots {
        return Err(ServiceError::InvalidInput(format!(
            "game {game} is outside 1..={slots}"
        )));
    }
    let mut session = session.lock().await;
    list_service::loaded_match(state, &mut session, match_id).await?;

    let entry = ResultEntry::new(request.score.trim(), &request.scorers);
    let entry = blob_store(state)
        .await?
        .upsert(match_id, game, entry)
        .await?;
    info!(match_id, game, score = %entry.score, "game result saved");
    Ok(GameResultSlot::new(match_id, game, Some(&entry)))
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::{AppConfig, Credentials},
        dao::{
            sheet_store::{Row, SheetStore, memory::MemorySheetStore},
            sheets::prepare_workbook,
            storage::StorageResult,
        },
        state::AppState,
    };

    /// Workbook whose cell reads take a while, widening any read-modify-write window.
    struct SlowCells(MemorySheetStore);

    impl SheetStore for SlowCells {
        fn read_table(&self, sheet: &str) -> BoxFuture<'static, StorageResult<Vec<Row>>> {
            self.0.read_table(sheet)
        }
        fn write_table(&self, sheet: &str, rows: Vec<Row>) -> BoxFuture<'static, StorageResult<()>> {
            self.0.write_table(sheet, rows)
        }
        fn read_cell(&self, sheet: &str, addr: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
            let read = self.0.read_cell(sheet, addr);
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                read.await
            })
        }
        fn write_cell(
            &self,
            sheet: &str,
            addr: &str,
            value: String,
        ) -> BoxFuture<'static, StorageResult<()>> {
            self.0.write_cell(sheet, addr, value)
        }
        fn append_row(&self, sheet: &str, row: Row) -> BoxFuture<'static, StorageResult<()>> {
            self.0.append_row(sheet, row)
        }
        fn delete_row(&self, sheet: &str, index: usize) -> BoxFuture<'static, StorageResult<()>> {
            self.0.delete_row(sheet, index)
        }
        fn ensure_sheet(
            &self,
            sheet: &str,
            header: Option<Row>,
        ) -> BoxFuture<'static, StorageResult<()>> {
            self.0.ensure_sheet(sheet, header)
        }
        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.0.health_check()
        }
        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.0.try_reconnect()
        }
    }

    async fn setup() -> (SharedState, MemorySheetStore, SessionHandle, SessionHandle) {
        let state = AppState::new(AppConfig::default(), Credentials::new("coach", "secret"));
        let store = MemorySheetStore::new();
        prepare_workbook(&store, &state.config().sheets).await.unwrap();
        state.set_sheet_store(Arc::new(store.clone())).await;
        let first = state.session(state.open_session()).unwrap();
        let second = state.session(state.open_session()).unwrap();
        (state, store, first, second)
    }

    fn request(score: &str, scorers: &str) -> UpsertResultRequest {
        UpsertResultRequest {
            score: score.into(),
            scorers: scorers.into(),
        }
    }

    #[tokio::test]
    async fn unsaved_slots_are_empty_defaults() {
        let (state, _, session, _) = setup().await;
        let results = load(&state, &session, 3).await.unwrap();
        assert_eq!(results.record.id, 3);
        assert_eq!(results.games.len(), 15);
        assert!(results.games.iter().all(|slot| !slot.saved));
        assert_eq!(results.games[0].key, "res_3_1");
        assert_eq!(results.games[14].scorers.len(), 10);
    }

    #[tokio::test]
    async fn writes_from_two_sessions_both_survive() {
        let (state, _, first, second) = setup().await;
        upsert(&state, &first, 4, 1, request("2-1", "Sato,  Ito ,,"))
            .await
            .unwrap();
        upsert(&state, &second, 5, 2, request("0-3", ""))
            .await
            .unwrap();

        let four = load(&state, &second, 4).await.unwrap();
        assert!(four.games[0].saved);
        assert_eq!(four.games[0].scorers_text, "Sato, Ito");
        let five = load(&state, &first, 5).await.unwrap();
        assert_eq!(five.games[1].score, "0-3");
        assert!(!five.games[0].saved);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_saves_of_one_session_both_land() {
        let (state, store, session, _) = setup().await;
        state.set_sheet_store(Arc::new(SlowCells(store))).await;

        let (first, second) = tokio::join!(
            upsert(&state, &session, 1, 1, request("1-0", "")),
            upsert(&state, &session, 1, 2, request("2-0", "")),
        );
        first.unwrap();
        second.unwrap();

        let results = load(&state, &session, 1).await.unwrap();
        assert!(results.games[0].saved);
        assert!(results.games[1].saved);
        assert_eq!(results.games[1].score, "2-0");
    }

    #[tokio::test]
    async fn game_index_is_bounded() {
        let (state, _, session, _) = setup().await;
        for game in [0, 16] {
            assert!(matches!(
                upsert(&state, &session, 1, game, request("1-0", "")).await,
                Err(ServiceError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let (state, _, session, _) = setup().await;
        assert!(matches!(
            load(&state, &session, 101).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
