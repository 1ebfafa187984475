/// Workbook kept as CouchDB documents, one per sheet.
#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::storage::{StorageError, StorageResult};

/// One sheet row, cell values as displayed text.
pub type Row = Vec<String>;

/// Per-cell character limit enforced by the hosted workbook service.
pub const DEFAULT_CELL_CHAR_LIMIT: usize = 50_000;

/// Gateway to the remote workbook. Every call is a full round trip; there are no transactions.
pub trait SheetStore: Send + Sync {
    /// Read every row of `sheet`, header included.
    fn read_table(&self, sheet: &str) -> BoxFuture<'static, StorageResult<Vec<Row>>>;
    /// Replace the whole content of `sheet`.
    fn write_table(&self, sheet: &str, rows: Vec<Row>) -> BoxFuture<'static, StorageResult<()>>;
    /// Read a single cell in A1 notation; `None` when the cell is empty or outside the grid.
    fn read_cell(&self, sheet: &str, addr: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Write a single cell in A1 notation, growing the grid as needed.
    fn write_cell(
        &self,
        sheet: &str,
        addr: &str,
        value: String,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Append a row after the last one.
    fn append_row(&self, sheet: &str, row: Row) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove the row at zero-based `index` (the header, when present, is index 0).
    fn delete_row(&self, sheet: &str, index: usize) -> BoxFuture<'static, StorageResult<()>>;
    /// Create `sheet` when it does not exist yet, seeding it with `header` if given.
    fn ensure_sheet(&self, sheet: &str, header: Option<Row>)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Zero-based grid coordinates decoded from an A1 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAddress {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column.
    pub column: usize,
}

impl CellAddress {
    /// Parse A1 notation such as `A2` or `AB10`.
    pub fn parse(addr: &str) -> Option<Self> {
        let addr = addr.trim();
        let split = addr.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = addr.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let column = letters
            .chars()
            .map(|c| (c.to_ascii_uppercase() as usize) - ('A' as usize) + 1)
            .fold(0usize, |acc, value| acc * 26 + value);
        let row = digits.parse::<usize>().ok().filter(|row| *row > 0)?;

        Some(Self {
            row: row - 1,
            column: column - 1,
        })
    }
}

/// Resolve `addr` or report it as a rejected request on `sheet`.
pub(crate) fn resolve_address(sheet: &str, addr: &str) -> StorageResult<CellAddress> {
    CellAddress::parse(addr).ok_or_else(|| StorageError::Rejected {
        sheet: sheet.to_string(),
        reason: format!("invalid cell address `{addr}`"),
    })
}

/// Read a cell out of an in-memory grid.
pub(crate) fn grid_cell(rows: &[Row], addr: CellAddress) -> Option<String> {
    rows.get(addr.row)
        .and_then(|row| row.get(addr.column))
        .filter(|value| !value.is_empty())
        .cloned()
}

/// Write a cell into an in-memory grid, padding rows and columns with empty cells.
pub(crate) fn set_grid_cell(rows: &mut Vec<Row>, addr: CellAddress, value: String) {
    if rows.len() <= addr.row {
        rows.resize_with(addr.row + 1, Vec::new);
    }
    let row = &mut rows[addr.row];
    if row.len() <= addr.column {
        row.resize(addr.column + 1, String::new());
    }
    row[addr.column] = value;
}

/// Reject any cell longer than `limit` characters.
pub(crate) fn check_cell_limit<'a>(
    sheet: &str,
    cells: impl IntoIterator<Item = &'a String>,
    limit: usize,
) -> StorageResult<()> {
    match cells
        .into_iter()
        .map(|cell| cell.chars().count())
        .find(|len| *len > limit)
    {
        Some(len) => Err(StorageError::Rejected {
            sheet: sheet.to_string(),
            reason: format!("cell holds {len} characters, limit is {limit}"),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a1_addresses() {
        assert_eq!(CellAddress::parse("A2"), Some(CellAddress { row: 1, column: 0 }));
        assert_eq!(CellAddress::parse("c1"), Some(CellAddress { row: 0, column: 2 }));
        assert_eq!(CellAddress::parse("AA10"), Some(CellAddress { row: 9, column: 26 }));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert_eq!(CellAddress::parse("2A"), None);
        assert_eq!(CellAddress::parse("A0"), None);
        assert_eq!(CellAddress::parse("A"), None);
        assert_eq!(CellAddress::parse("A-1"), None);
    }

    #[test]
    fn writing_a_cell_grows_the_grid() {
        let mut rows = Vec::new();
        let addr = CellAddress::parse("B2").unwrap();
        set_grid_cell(&mut rows, addr, "x".into());
        assert_eq!(rows, vec![vec![], vec![String::new(), "x".to_string()]]);
        assert_eq!(grid_cell(&rows, addr).as_deref(), Some("x"));
        assert_eq!(grid_cell(&rows, CellAddress::parse("A1").unwrap()), None);
    }

    #[test]
    fn cell_limit_counts_characters() {
        let cells = vec!["あいう".to_string()];
        assert!(check_cell_limit("s", &cells, 3).is_ok());
        assert!(check_cell_limit("s", &cells, 2).is_err());
    }
}
