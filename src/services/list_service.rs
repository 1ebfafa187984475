//! List screen: lazy loading of the master list, filtered views and edit batches.

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        models::Category,
        sheets::{decode_list, encode_list},
    },
    dto::{
        matches::{
            EditBatchRequest, EditBatchResponse, ListQuery, ListViewResponse, MatchRow,
            MatchSummary,
        },
        session::ScreenResponse,
    },
    error::ServiceError,
    state::{
        SessionHandle, SharedState,
        reconciliation::{EditBatch, reconcile},
        records::{RecordStore, ViewFilter},
        session::Session,
    },
};

/// Load the master list into the session on first use.
///
/// An empty list sheet is replaced in memory by a seeded block of blank records;
/// the block reaches the workbook with the first persisted edit.
async fn ensure_records(state: &SharedState, session: &mut Session) -> Result<(), ServiceError> {
    if session.records.is_some() {
        return Ok(());
    }

    let store = state.require_sheet_store().await?;
    let config = state.config();
    let sheet = config.sheets.list.as_str();
    let rows = store.read_table(sheet).await?;
    let records = decode_list(sheet, rows)?;

    let records = if records.is_empty() {
        let today = OffsetDateTime::now_utc().date();
        info!(
            sheet,
            seed_rows = config.seed_rows,
            "list sheet is empty; seeding blank records"
        );
        RecordStore::seeded(config.seed_rows, config.default_category, today)
    } else {
        debug!(sheet, records = records.len(), "list sheet loaded");
        RecordStore::new(records)
    };
    session.records = Some(records);
    Ok(())
}

/// Overwrite the whole list sheet with the session's master list.
async fn persist(state: &SharedState, session: &Session) -> Result<(), ServiceError> {
    let Some(records) = session.records.as_ref() else {
        return Ok(());
    };
    let store = state.require_sheet_store().await?;
    let sheet = state.config().sheets.list.as_str();
    store
        .write_table(sheet, encode_list(records.records()))
        .await?;
    debug!(sheet, records = records.len(), "list sheet written");
    Ok(())
}

/// Compute and retain the filtered view of the master list.
pub async fn list_view(
    state: &SharedState,
    session: &SessionHandle,
    query: ListQuery,
) -> Result<ListViewResponse, ServiceError> {
    let category = query
        .category()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    let filter = ViewFilter::new(query.search, category);

    let mut session = session.lock().await;
    ensure_records(state, &mut session).await?;
    session.refresh_view(&filter);

    let (Some(view), Some(records)) = (session.view.as_ref(), session.records.as_ref()) else {
        return Err(ServiceError::Internal("records missing after load".into()));
    };
    let rows = view
        .rows(records)
        .enumerate()
        .map(|(row, record)| MatchRow::new(row, record))
        .collect();

    Ok(ListViewResponse {
        view_generation: view.generation(),
        total: records.len(),
        categories: Category::ALL.to_vec(),
        rows,
    })
}

/// Reconcile an edit batch against the retained view, then persist the list.
///
/// When the write fails the in-memory edits and any navigation stay applied and
/// the error is returned; the next successful batch writes them again.
pub async fn apply_edits(
    state: &SharedState,
    session: &SessionHandle,
    request: EditBatchRequest,
) -> Result<EditBatchResponse, ServiceError> {
    let batch = EditBatch::from(request);
    let mut session = session.lock().await;
    let outcome = reconcile(&mut session, &batch)?;

    if outcome.applied > 0 {
        if let Err(err) = persist(state, &session).await {
            warn!(error = %err, applied = outcome.applied, "failed to persist edit batch");
            return Err(err);
        }
        info!(
            applied = outcome.applied,
            skipped = outcome.skipped,
            "edit batch saved"
        );
    }

    Ok(EditBatchResponse {
        applied: outcome.applied,
        skipped: outcome.skipped,
        screen: ScreenResponse::from(session.navigation.snapshot()),
    })
}

/// Persisted columns of one match, loading the list when needed.
pub async fn require_match(
    state: &SharedState,
    session: &SessionHandle,
    match_id: u32,
) -> Result<MatchSummary, ServiceError> {
    let mut session = session.lock().await;
    loaded_match(state, &mut session, match_id).await
}

/// Same as [`require_match`] for callers already holding the session lock.
pub(crate) async fn loaded_match(
    state: &SharedState,
    session: &mut Session,
    match_id: u32,
) -> Result<MatchSummary, ServiceError> {
    ensure_records(state, session).await?;
    session
        .records
        .as_ref()
        .and_then(|records| records.get(match_id))
        .map(MatchSummary::from)
        .ok_or_else(|| ServiceError::NotFound(format!("match {match_id}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::{AppConfig, Credentials},
        dao::{
            models::MatchField,
            sheet_store::{SheetStore, memory::MemorySheetStore},
            sheets::{list_header, prepare_workbook},
            storage::StorageError,
        },
        dto::{
            matches::{ActionInput, ChangeInput},
            session::ScreenKind,
        },
        state::AppState,
    };

    async fn setup() -> (SharedState, MemorySheetStore, SessionHandle) {
        let config = AppConfig {
            seed_rows: 5,
            ..AppConfig::default()
        };
        let state = AppState::new(config, Credentials::new("coach", "secret"));
        let store = MemorySheetStore::new();
        prepare_workbook(&store, &state.config().sheets).await.unwrap();
        state.set_sheet_store(Arc::new(store.clone())).await;
        let token = state.open_session();
        let session = state.session(token).unwrap();
        (state, store, session)
    }

    fn query(search: Option<&str>, category: Option<&str>) -> ListQuery {
        ListQuery {
            search: search.map(str::to_string),
            category: category.map(str::to_string),
        }
    }

    fn edit(row: usize, field: MatchField, value: &str) -> ChangeInput {
        ChangeInput::Field {
            row,
            field,
            value: value.into(),
        }
    }

    #[tokio::test]
    async fn empty_workbook_is_seeded_in_memory() {
        let (state, store, session) = setup().await;
        let view = list_view(&state, &session, query(None, None)).await.unwrap();
        assert_eq!(view.total, 5);
        assert_eq!(view.rows.len(), 5);
        assert_eq!(view.rows[0].record.id, 1);
        assert_eq!(view.rows[0].record.category, Category::U12);

        // Only the header exists until the first edit is saved.
        assert_eq!(store.read_table("matches").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn filtered_edit_is_saved_on_the_right_record() {
        let (state, store, session) = setup().await;
        list_view(&state, &session, query(None, None)).await.unwrap();
        apply_edits(
            &state,
            &session,
            EditBatchRequest {
                view_generation: None,
                changes: vec![
                    edit(1, MatchField::Category, "U9"),
                    edit(3, MatchField::Category, "U9"),
                ],
            },
        )
        .await
        .unwrap();

        let view = list_view(&state, &session, query(None, Some("U9"))).await.unwrap();
        assert_eq!(
            view.rows.iter().map(|row| row.record.id).collect::<Vec<_>>(),
            [2, 4]
        );

        let response = apply_edits(
            &state,
            &session,
            EditBatchRequest {
                view_generation: Some(view.view_generation),
                changes: vec![edit(1, MatchField::Opponent, "Blue Stars")],
            },
        )
        .await
        .unwrap();
        assert_eq!(response.applied, 1);
        assert_eq!(response.screen.screen, ScreenKind::List);

        let table = store.read_table("matches").await.unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table[4][3], "Blue Stars");
        assert!(table.iter().skip(1).filter(|row| row[3] == "Blue Stars").count() == 1);
    }

    #[tokio::test]
    async fn toggle_navigates_without_touching_the_workbook() {
        let (state, store, session) = setup().await;
        list_view(&state, &session, query(None, None)).await.unwrap();
        let response = apply_edits(
            &state,
            &session,
            EditBatchRequest {
                view_generation: None,
                changes: vec![ChangeInput::Action {
                    row: 2,
                    action: ActionInput::Media,
                    value: true,
                }],
            },
        )
        .await
        .unwrap();

        assert_eq!(response.screen.screen, ScreenKind::Media);
        assert_eq!(response.screen.match_id, Some(3));
        assert_eq!(store.read_table("matches").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_save_keeps_edits_in_memory() {
        let (state, store, session) = setup().await;
        list_view(&state, &session, query(None, None)).await.unwrap();
        store.set_offline(true);

        let err = apply_edits(
            &state,
            &session,
            EditBatchRequest {
                view_generation: None,
                changes: vec![edit(0, MatchField::Venue, "Riverside")],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Unavailable(StorageError::Unavailable { .. })
        ));

        store.set_offline(false);
        let view = list_view(&state, &session, query(Some("riverside"), None))
            .await
            .unwrap();
        assert_eq!(view.rows.len(), 1);
    }

    #[tokio::test]
    async fn existing_sheet_is_loaded_as_is() {
        let (state, store, session) = setup().await;
        store
            .ensure_sheet("matches", Some(list_header()))
            .await
            .unwrap();
        let mut rows = store.read_table("matches").await.unwrap();
        rows.push(
            ["42", "U8", "2024-05-05", "Reds", "Park", "league", ""]
                .map(str::to_string)
                .to_vec(),
        );
        store.write_table("matches", rows).await.unwrap();

        let view = list_view(&state, &session, query(None, Some("all"))).await.unwrap();
        assert_eq!(view.total, 1);
        assert_eq!(view.rows[0].record.id, 42);
        assert_eq!(view.rows[0].record.date, "2024-05-05");

        assert!(require_match(&state, &session, 42).await.is_ok());
        assert!(matches!(
            require_match(&state, &session, 7).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let (state, _, session) = setup().await;
        assert!(matches!(
            list_view(&state, &session, query(None, Some("U20"))).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn degraded_state_fails_fast() {
        let (state, _, session) = setup().await;
        state.clear_sheet_store().await;
        assert!(matches!(
            list_view(&state, &session, query(None, None)).await,
            Err(ServiceError::Degraded)
        ));
    }
}
