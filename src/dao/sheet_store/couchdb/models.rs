use serde::{Deserialize, Serialize};

use crate::dao::sheet_store::Row;

pub const SHEET_PREFIX: &str = "sheet::";

/// One sheet of the workbook stored as a single CouchDB document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Sheet title as shown in the workbook.
    pub title: String,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl SheetDocument {
    /// Fresh document for a sheet that does not exist yet.
    pub fn new(title: &str, rows: Vec<Row>) -> Self {
        Self {
            id: sheet_doc_id(title),
            rev: None,
            title: title.to_string(),
            rows,
        }
    }
}

pub fn sheet_doc_id(title: &str) -> String {
    format!("{}{}", SHEET_PREFIX, title)
}
