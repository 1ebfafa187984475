use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, macros::format_description};
use utoipa::ToSchema;

/// Fixed number of scorer slots stored for every game result.
pub const SCORER_SLOTS: usize = 10;

/// Age bracket a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Category {
    /// Under 8.
    U8,
    /// Under 9.
    U9,
    /// Under 10.
    U10,
    /// Under 11.
    U11,
    /// Under 12.
    U12,
}

impl Category {
    /// Every category in display order.
    pub const ALL: [Category; 5] = [
        Category::U8,
        Category::U9,
        Category::U10,
        Category::U11,
        Category::U12,
    ];

    /// Label used in the list sheet and in the filter options.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::U8 => "U8",
            Category::U9 => "U9",
            Category::U10 => "U10",
            Category::U11 => "U11",
            Category::U12 => "U12",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = FieldError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| FieldError::UnknownCategory(trimmed.to_string()))
    }
}

/// Failure to interpret a raw cell or edit value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Category cell outside `U8`..`U12`.
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    /// Date cell not in `YYYY-MM-DD` form.
    #[error("invalid date `{0}` (expected YYYY-MM-DD)")]
    InvalidDate(String),
    /// Id cell that is not a positive integer.
    #[error("invalid match id `{0}`")]
    InvalidId(String),
}

/// Render a calendar date the way the list sheet stores it.
pub fn format_date(date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");
    date.format(&format)
        .unwrap_or_else(|_| "invalid-date".into())
}

/// Parse an ISO-8601 calendar date. A trailing time component is ignored.
pub fn parse_date(value: &str) -> Result<Date, FieldError> {
    let format = format_description!("[year]-[month]-[day]");
    let trimmed = value.trim();
    let day_part = match trimmed.char_indices().nth(10) {
        Some((idx, ' ' | 'T')) => &trimmed[..idx],
        _ => trimmed,
    };
    Date::parse(day_part, &format).map_err(|_| FieldError::InvalidDate(value.to_string()))
}

/// One scheduled match together with its transient action flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// Stable identifier, the only join key between a view and the master list.
    pub id: u32,
    /// Age bracket.
    pub category: Category,
    /// Kick-off day.
    pub date: Date,
    /// Opposing team.
    pub opponent: String,
    /// Ground or hall.
    pub venue: String,
    /// Free-form competition label.
    pub classification: String,
    /// Free-form remarks.
    pub notes: String,
    /// Set while a "show detail" toggle is being consumed. Never persisted.
    pub detail_flag: bool,
    /// Set while a "show media" toggle is being consumed. Never persisted.
    pub media_flag: bool,
}

impl MatchRecord {
    /// Empty record used when seeding a fresh list sheet.
    pub fn blank(id: u32, category: Category, date: Date) -> Self {
        Self {
            id,
            category,
            date,
            opponent: String::new(),
            venue: String::new(),
            classification: String::new(),
            notes: String::new(),
            detail_flag: false,
            media_flag: false,
        }
    }

    /// String rendering of every persisted field, used by the keyword search.
    pub fn rendered_fields(&self) -> [String; 7] {
        [
            self.id.to_string(),
            self.category.to_string(),
            format_date(self.date),
            self.opponent.clone(),
            self.venue.clone(),
            self.classification.clone(),
            self.notes.clone(),
        ]
    }

    /// Apply an already validated field update.
    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Category(category) => self.category = category,
            FieldUpdate::Date(date) => self.date = date,
            FieldUpdate::Opponent(value) => self.opponent = value,
            FieldUpdate::Venue(value) => self.venue = value,
            FieldUpdate::Classification(value) => self.classification = value,
            FieldUpdate::Notes(value) => self.notes = value,
        }
    }
}

/// Editable columns of the list grid. `id` is immutable and the action flags travel separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    /// `category` column.
    Category,
    /// `date` column.
    Date,
    /// `opponent` column.
    Opponent,
    /// `venue` column.
    Venue,
    /// `classification` column.
    Classification,
    /// `notes` column.
    Notes,
}

/// A typed new value for one [`MatchField`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// New age bracket.
    Category(Category),
    /// New day.
    Date(Date),
    /// New opponent.
    Opponent(String),
    /// New venue.
    Venue(String),
    /// New classification.
    Classification(String),
    /// New notes.
    Notes(String),
}

impl FieldUpdate {
    /// Interpret the raw grid value for `field`.
    pub fn parse(field: MatchField, raw: &str) -> Result<Self, FieldError> {
        Ok(match field {
            MatchField::Category => FieldUpdate::Category(raw.parse()?),
            MatchField::Date => FieldUpdate::Date(parse_date(raw)?),
            MatchField::Opponent => FieldUpdate::Opponent(raw.to_string()),
            MatchField::Venue => FieldUpdate::Venue(raw.to_string()),
            MatchField::Classification => FieldUpdate::Classification(raw.to_string()),
            MatchField::Notes => FieldUpdate::Notes(raw.to_string()),
        })
    }
}

/// Per-game result stored inside the results blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResultEntry {
    /// Free-form score, e.g. "2-1".
    pub score: String,
    /// Exactly [`SCORER_SLOTS`] names, unused slots are empty strings.
    pub scorers: Vec<String>,
}

impl ResultEntry {
    /// Build an entry from the comma separated scorer text typed by the user.
    pub fn new(score: impl Into<String>, scorers_text: &str) -> Self {
        Self {
            score: score.into(),
            scorers: parse_scorers(scorers_text),
        }
    }

    /// Default shown for a game slot without a stored result.
    pub fn empty() -> Self {
        Self {
            score: String::new(),
            scorers: vec![String::new(); SCORER_SLOTS],
        }
    }

    /// Force the scorer list back to exactly [`SCORER_SLOTS`] entries.
    pub fn normalized(mut self) -> Self {
        self.scorers.resize(SCORER_SLOTS, String::new());
        self
    }

    /// Non-empty scorers joined back into the editor text.
    pub fn scorers_text(&self) -> String {
        self.scorers
            .iter()
            .filter(|name| !name.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Split, trim and pad/truncate a comma separated scorer list to [`SCORER_SLOTS`] entries.
pub fn parse_scorers(text: &str) -> Vec<String> {
    let mut scorers = text
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .take(SCORER_SLOTS)
        .map(str::to_string)
        .collect::<Vec<_>>();
    scorers.resize(SCORER_SLOTS, String::new());
    scorers
}

/// Whole results blob: composite key to entry, in insertion order.
pub type ResultMap = IndexMap<String, ResultEntry>;

/// Composite key of one game result inside the blob.
pub fn result_key(match_id: u32, game_index: u32) -> String {
    format!("{}{}", result_key_prefix(match_id), game_index)
}

/// Prefix shared by every result key of `match_id`.
pub fn result_key_prefix(match_id: u32) -> String {
    format!("res_{match_id}_")
}

/// Stored attachment of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Match the attachment belongs to.
    pub match_id: u32,
    /// Name given at upload.
    pub filename: String,
    /// Base64 text stored in the sheet.
    pub encoded_payload: String,
    /// Length of `encoded_payload`.
    pub encoded_size: usize,
}

impl MediaItem {
    /// Attachment with its size computed from the payload.
    pub fn new(match_id: u32, filename: impl Into<String>, encoded_payload: String) -> Self {
        let encoded_size = encoded_payload.len();
        Self {
            match_id,
            filename: filename.into(),
            encoded_payload,
            encoded_size,
        }
    }
}
