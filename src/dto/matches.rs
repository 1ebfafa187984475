use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::{Category, FieldError, MatchField, MatchRecord, format_date},
    dto::session::ScreenResponse,
    state::reconciliation::{ActionKind, BatchChange, EditBatch},
};

/// Keyword and category filter of the list screen.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Case-insensitive substring matched against every column.
    #[validate(length(max = 200))]
    pub search: Option<String>,
    /// One of `U8`..`U12`, or `all` for no category filter.
    pub category: Option<String>,
}

impl ListQuery {
    /// Selected category; `None` when absent, blank or `all`.
    pub fn category(&self) -> Result<Option<Category>, FieldError> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
            Some(value) => value.parse().map(Some),
        }
    }
}

/// Persisted columns of a match.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSummary {
    /// Stable match id.
    pub id: u32,
    /// Age bracket.
    pub category: Category,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Opposing team.
    pub opponent: String,
    /// Ground or hall.
    pub venue: String,
    /// Competition label.
    pub classification: String,
    /// Remarks.
    pub notes: String,
}

impl From<&MatchRecord> for MatchSummary {
    fn from(record: &MatchRecord) -> Self {
        Self {
            id: record.id,
            category: record.category,
            date: format_date(record.date),
            opponent: record.opponent.clone(),
            venue: record.venue.clone(),
            classification: record.classification.clone(),
            notes: record.notes.clone(),
        }
    }
}

/// One grid row: position in the view, columns and action toggles.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchRow {
    /// Position used to address this row in an edit batch.
    pub row: usize,
    /// Persisted columns.
    #[serde(flatten)]
    pub record: MatchSummary,
    /// Detail toggle, always off once a batch is processed.
    pub detail: bool,
    /// Media toggle, always off once a batch is processed.
    pub media: bool,
}

impl MatchRow {
    /// Row `row` of a view showing `record`.
    pub fn new(row: usize, record: &MatchRecord) -> Self {
        Self {
            row,
            record: record.into(),
            detail: record.detail_flag,
            media: record.media_flag,
        }
    }
}

/// Filtered list presented on the list screen.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListViewResponse {
    /// Echo in the next edit batch to detect stale grids.
    pub view_generation: u64,
    /// Number of records in the master list.
    pub total: usize,
    /// Options of the category filter, `all` excluded.
    pub categories: Vec<Category>,
    /// Rows of the view, in view order.
    pub rows: Vec<MatchRow>,
}

/// Toggle column of a list row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionInput {
    /// Opens the detail screen.
    Detail,
    /// Opens the media screen.
    Media,
}

impl From<ActionInput> for ActionKind {
    fn from(value: ActionInput) -> Self {
        match value {
            ActionInput::Detail => ActionKind::Detail,
            ActionInput::Media => ActionKind::Media,
        }
    }
}

/// A grid change addressed by view row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeInput {
    /// New value typed into a column.
    Field {
        /// Position in the view.
        row: usize,
        /// Edited column.
        field: MatchField,
        /// Text as typed.
        value: String,
    },
    /// A toggle switched on or off.
    Action {
        /// Position in the view.
        row: usize,
        /// Toggled column.
        action: ActionInput,
        /// New toggle state; only `true` navigates.
        value: bool,
    },
}

impl From<ChangeInput> for BatchChange {
    fn from(value: ChangeInput) -> Self {
        match value {
            ChangeInput::Field { row, field, value } => BatchChange::Field { row, field, value },
            ChangeInput::Action { row, action, value } => BatchChange::Action {
                row,
                action: action.into(),
                value,
            },
        }
    }
}

/// Changes made in one interaction with the grid, in the order they happened.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EditBatchRequest {
    /// Generation returned by the last list request; omitted skips the staleness check.
    #[serde(default)]
    pub view_generation: Option<u64>,
    /// Changes in the order they were made.
    #[validate(length(max = 1000))]
    pub changes: Vec<ChangeInput>,
}

impl From<EditBatchRequest> for EditBatch {
    fn from(value: EditBatchRequest) -> Self {
        Self {
            view_generation: value.view_generation,
            changes: value.changes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of an edit batch.
#[derive(Debug, Serialize, ToSchema)]
pub struct EditBatchResponse {
    /// Field edits written to the list.
    pub applied: usize,
    /// Changes ignored.
    pub skipped: usize,
    /// Screen after the batch; differs from `list` when a toggle navigated.
    pub screen: ScreenResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_and_blank_mean_no_category() {
        for raw in [None, Some(""), Some(" all "), Some("ALL")] {
            let query = ListQuery {
                search: None,
                category: raw.map(str::to_string),
            };
            assert_eq!(query.category(), Ok(None));
        }
        let query = ListQuery {
            search: None,
            category: Some("u11".into()),
        };
        assert_eq!(query.category(), Ok(Some(Category::U11)));
    }

    #[test]
    fn changes_are_tagged_by_kind() {
        let request: EditBatchRequest = serde_json::from_str(
            r#"{"changes": [
                {"kind": "field", "row": 2, "field": "venue", "value": "Hall"},
                {"kind": "action", "row": 0, "action": "media", "value": true}
            ]}"#,
        )
        .unwrap();
        let batch = EditBatch::from(request);
        assert_eq!(batch.view_generation, None);
        assert_eq!(
            batch.changes,
            [
                BatchChange::Field {
                    row: 2,
                    field: MatchField::Venue,
                    value: "Hall".into()
                },
                BatchChange::Action {
                    row: 0,
                    action: ActionKind::Media,
                    value: true
                },
            ]
        );
    }

    #[test]
    fn oversized_batches_fail_validation() {
        let change = ChangeInput::Field {
            row: 0,
            field: MatchField::Notes,
            value: "x".into(),
        };
        let mut request = EditBatchRequest {
            view_generation: None,
            changes: vec![change; 1000],
        };
        assert!(request.validate().is_ok());

        request.changes.push(ChangeInput::Action {
            row: 0,
            action: ActionInput::Detail,
            value: true,
        });
        assert!(request.validate().is_err());
    }
}
