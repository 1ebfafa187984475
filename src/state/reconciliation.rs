//! Translation of view-relative edit batches into master record mutations.

use thiserror::Error;
use tracing::debug;

use crate::{
    dao::models::{FieldError, FieldUpdate, MatchField, MatchRecord},
    state::{
        navigation::{ApplyError, NavigationEvent, NavigationStateMachine, PlanError, Screen},
        session::Session,
    },
};

/// Action toggles rendered as checkbox columns of the list grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Open the per-game results of the row.
    Detail,
    /// Open the attachments of the row.
    Media,
}

/// One change of a batch, addressed by its position in the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchChange {
    /// A persisted column was edited.
    Field {
        row: usize,
        field: MatchField,
        value: String,
    },
    /// An action toggle was switched. These never reach the persisted schema.
    Action {
        row: usize,
        action: ActionKind,
        value: bool,
    },
}

/// Changes submitted together from one user interaction, in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBatch {
    /// Generation of the view the client edited; checked when present.
    pub view_generation: Option<u64>,
    /// Changes in the order they were made.
    pub changes: Vec<BatchChange>,
}

/// What a batch did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Number of field edits applied to the master list.
    pub applied: usize,
    /// Changes ignored: toggles switched off and everything after a navigation.
    pub skipped: usize,
    /// Screen entered because of an action toggle.
    pub transition: Option<Screen>,
}

/// Reasons a batch is refused as a whole.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The session is not on the list screen.
    #[error("edits are only accepted on the list screen (current screen {0:?})")]
    NotOnList(Screen),
    /// No view was handed out yet.
    #[error("no list view has been requested yet")]
    NoView,
    /// The batch was made on an older view.
    #[error("view {got} is stale, current view is {expected}")]
    StaleView { expected: u64, got: u64 },
    /// A change addresses a row past the end of the view.
    #[error("row {row} is outside the current view ({len} rows)")]
    RowOutOfRange { row: usize, len: usize },
    /// The view points at an id missing from the list.
    #[error("match {0} is no longer in the list")]
    UnknownRecord(u32),
    /// A field value could not be parsed.
    #[error("invalid value for `{field:?}` on row {row}")]
    InvalidValue {
        row: usize,
        field: MatchField,
        #[source]
        source: FieldError,
    },
    /// The toggle cannot navigate from the current screen.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// The planned transition could not be applied.
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// Apply `batch` to the session's master records and navigation state.
///
/// Rows are resolved through the retained view, never used as master positions.
/// The whole batch is validated before anything is mutated. The first action
/// toggle switched on (in batch order) triggers a navigation and ends the batch.
pub fn reconcile(session: &mut Session, batch: &EditBatch) -> Result<ReconcileOutcome, ReconcileError> {
    let screen = session.navigation.screen();
    if screen != Screen::List {
        return Err(ReconcileError::NotOnList(screen));
    }

    let view = session.view.as_ref().ok_or(ReconcileError::NoView)?;
    if let Some(got) = batch.view_generation
        && got != view.generation()
    {
        return Err(ReconcileError::StaleView {
            expected: view.generation(),
            got,
        });
    }
    let records = session.records.as_mut().ok_or(ReconcileError::NoView)?;

    let resolve = |row: usize| -> Result<u32, ReconcileError> {
        let id = view.resolve(row).ok_or(ReconcileError::RowOutOfRange {
            row,
            len: view.len(),
        })?;
        match records.get(id) {
            Some(_) => Ok(id),
            None => Err(ReconcileError::UnknownRecord(id)),
        }
    };

    let mut updates = Vec::new();
    let mut navigation = None;
    let mut skipped = 0;
    for (index, change) in batch.changes.iter().enumerate() {
        match change {
            BatchChange::Field { row, field, value } => {
                let id = resolve(*row)?;
                let update =
                    FieldUpdate::parse(*field, value).map_err(|source| ReconcileError::InvalidValue {
                        row: *row,
                        field: *field,
                        source,
                    })?;
                updates.push((id, update));
            }
            BatchChange::Action { row, action, value } => {
                if !*value {
                    skipped += 1;
                    continue;
                }
                let id = resolve(*row)?;
                navigation = Some((id, *action));
                skipped += batch.changes.len() - index - 1;
                break;
            }
        }
    }

    let applied = updates.len();
    for (id, update) in updates {
        if let Some(record) = records.get_mut(id) {
            record.apply(update);
        }
    }

    let transition = match navigation {
        Some((id, action)) => {
            let Some(record) = records.get_mut(id) else {
                return Err(ReconcileError::UnknownRecord(id));
            };
            Some(navigate(&mut session.navigation, record, action)?)
        }
        None => None,
    };

    debug!(applied, skipped, ?transition, "edit batch reconciled");
    Ok(ReconcileOutcome {
        applied,
        skipped,
        transition,
    })
}

/// Land the toggle on the record, then reset it before the screen changes.
fn navigate(
    navigation: &mut NavigationStateMachine,
    record: &mut MatchRecord,
    action: ActionKind,
) -> Result<Screen, ReconcileError> {
    let event = match action {
        ActionKind::Detail => {
            record.detail_flag = true;
            NavigationEvent::OpenDetail(record.id)
        }
        ActionKind::Media => {
            record.media_flag = true;
            NavigationEvent::OpenMedia(record.id)
        }
    };

    let plan = match navigation.plan(event) {
        Ok(plan) => plan,
        Err(err) => {
            record.detail_flag = false;
            record.media_flag = false;
            return Err(err.into());
        }
    };

    match action {
        ActionKind::Detail => record.detail_flag = false,
        ActionKind::Media => record.media_flag = false,
    }

    Ok(navigation.apply(plan.id)?)
}
