use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{ResultEntry, result_key},
    dto::matches::MatchSummary,
};

/// One game of the detail screen, stored or not.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameResultSlot {
    /// One-based game number.
    pub game: u32,
    /// Composite key inside the results blob.
    pub key: String,
    /// Score text, empty when unsaved.
    pub score: String,
    /// Always ten entries, unused ones empty.
    pub scorers: Vec<String>,
    /// Non-empty scorers joined with `, `.
    pub scorers_text: String,
    /// Whether an entry exists in the results blob.
    pub saved: bool,
}

impl GameResultSlot {
    /// Slot `game` of `match_id`, empty when `entry` is `None`.
    pub fn new(match_id: u32, game: u32, entry: Option<&ResultEntry>) -> Self {
        let saved = entry.is_some();
        let entry = entry.cloned().unwrap_or_else(ResultEntry::empty);
        Self {
            game,
            key: result_key(match_id, game),
            scorers_text: entry.scorers_text(),
            score: entry.score,
            scorers: entry.scorers,
            saved,
        }
    }
}

/// Detail screen content.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchResultsResponse {
    /// Persisted columns of the match.
    #[serde(rename = "match")]
    pub record: MatchSummary,
    /// One slot per game, in game order.
    pub games: Vec<GameResultSlot>,
}

/// Score and comma separated scorers typed for one game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpsertResultRequest {
    /// Score text, e.g. `2-1`.
    #[serde(default)]
    #[validate(length(max = 64))]
    pub score: String,
    /// Comma separated scorer names; blanks are dropped.
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub scorers: String,
}
