//! Row and cell layouts of the three sheets making up the workbook.

use std::collections::HashMap;

use tracing::warn;

use crate::{
    config::SheetLayout,
    dao::{
        models::{Category, FieldError, MatchRecord, MediaItem, ResultMap, format_date, parse_date},
        sheet_store::{Row, SheetStore},
        storage::{StorageError, StorageResult},
    },
};

/// Header of the list sheet. The transient action flags are never part of it.
pub const LIST_HEADER: [&str; 7] = [
    "id",
    "category",
    "date",
    "opponent",
    "venue",
    "classification",
    "notes",
];

/// Header of the media sheet.
pub const MEDIA_HEADER: [&str; 3] = ["matchId", "filename", "encodedPayload"];

/// Header row for the list sheet.
pub fn list_header() -> Row {
    LIST_HEADER.iter().map(|name| name.to_string()).collect()
}

/// Header row for the media sheet.
pub fn media_header() -> Row {
    MEDIA_HEADER.iter().map(|name| name.to_string()).collect()
}

/// Create whichever of the list, results and media sheets is missing.
///
/// Existing sheets are left untouched, so this runs on every (re)connection.
pub async fn prepare_workbook(store: &dyn SheetStore, layout: &SheetLayout) -> StorageResult<()> {
    store.ensure_sheet(&layout.list, Some(list_header())).await?;
    store.ensure_sheet(&layout.results, None).await?;
    store.ensure_sheet(&layout.media, Some(media_header())).await?;
    Ok(())
}

/// Full list sheet content (header first) for the given records.
pub fn encode_list(records: &[MatchRecord]) -> Vec<Row> {
    let header = list_header();
    std::iter::once(header)
        .chain(records.iter().map(|record| {
            vec![
                record.id.to_string(),
                record.category.to_string(),
                format_date(record.date),
                record.opponent.clone(),
                record.venue.clone(),
                record.classification.clone(),
                record.notes.clone(),
            ]
        }))
        .collect()
}

/// Decode the list sheet. An empty sheet, or one holding only a header, yields no records.
pub fn decode_list(sheet: &str, rows: Vec<Row>) -> StorageResult<Vec<MatchRecord>> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };

    let columns = LIST_HEADER
        .iter()
        .map(|name| {
            header
                .iter()
                .position(|cell| cell.trim() == *name)
                .ok_or_else(|| StorageError::malformed(sheet, format!("missing column `{name}`")))
        })
        .collect::<StorageResult<Vec<_>>>()?;

    let mut records = Vec::new();
    let mut seen = HashMap::new();
    for (offset, row) in rows.enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let cell = |column: usize| {
            row.get(columns[column])
                .map(String::as_str)
                .unwrap_or_default()
        };
        // +2: one-based rows plus the header.
        let line = offset + 2;
        let record = decode_list_row(cell)
            .map_err(|err| StorageError::malformed(sheet, format!("row {line}: {err}")))?;
        if let Some(first) = seen.insert(record.id, line) {
            return Err(StorageError::malformed(
                sheet,
                format!("duplicate id {} at row {line} (first at row {first})", record.id),
            ));
        }
        records.push(record);
    }

    Ok(records)
}

fn decode_list_row<'a>(cell: impl Fn(usize) -> &'a str) -> Result<MatchRecord, FieldError> {
    let raw_id = cell(0).trim();
    let id = raw_id
        .parse::<u32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| FieldError::InvalidId(raw_id.to_string()))?;
    let category = cell(1).parse::<Category>()?;
    let date = parse_date(cell(2))?;

    let mut record = MatchRecord::blank(id, category, date);
    record.opponent = cell(3).to_string();
    record.venue = cell(4).to_string();
    record.classification = cell(5).to_string();
    record.notes = cell(6).to_string();
    Ok(record)
}

/// Decode the results blob. A missing or blank cell is an empty map.
pub fn decode_results(raw: Option<&str>) -> Result<ResultMap, serde_json::Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(ResultMap::new()),
        Some(text) => {
            let map = serde_json::from_str::<ResultMap>(text)?;
            Ok(map
                .into_iter()
                .map(|(key, entry)| (key, entry.normalized()))
                .collect())
        }
    }
}

/// Encode the results blob, keeping non-ASCII names readable.
pub fn encode_results(map: &ResultMap) -> Result<String, serde_json::Error> {
    serde_json::to_string(map)
}

/// Media sheet row for an upload.
pub fn encode_media_row(item: &MediaItem) -> Row {
    vec![
        item.match_id.to_string(),
        item.filename.clone(),
        item.encoded_payload.clone(),
    ]
}

/// Media rows with their index inside the sheet (the header sits at index 0).
pub fn decode_media(sheet: &str, rows: Vec<Row>) -> Vec<(usize, MediaItem)> {
    rows.into_iter()
        .enumerate()
        .skip(1)
        .filter_map(|(index, row)| {
            let mut cells = row.into_iter();
            let raw_id = cells.next().unwrap_or_default();
            let Ok(match_id) = raw_id.trim().parse::<u32>() else {
                if !raw_id.trim().is_empty() {
                    warn!(sheet, index, raw_id = %raw_id, "skipping media row with invalid match id");
                }
                return None;
            };
            let filename = cells.next().unwrap_or_default();
            let payload = cells.next().unwrap_or_default();
            Some((index, MediaItem::new(match_id, filename, payload)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{
        models::{ResultEntry, result_key},
        sheet_store::memory::MemorySheetStore,
    };
    use time::macros::date;

    fn record(id: u32, opponent: &str) -> MatchRecord {
        let mut record = MatchRecord::blank(id, Category::U10, date!(2024 - 06 - 01));
        record.opponent = opponent.into();
        record
    }

    #[test]
    fn list_sheet_has_exact_header_and_no_flags() {
        let mut flagged = record(1, "Minami");
        flagged.detail_flag = true;
        let rows = encode_list(&[flagged]);
        assert_eq!(rows[0], LIST_HEADER.map(String::from).to_vec());
        assert_eq!(
            rows[1],
            vec!["1", "U10", "2024-06-01", "Minami", "", "", ""]
        );
    }

    #[test]
    fn encoding_the_same_records_twice_is_identical() {
        let records = vec![record(1, "A"), record(2, "B"), record(3, "C")];
        assert_eq!(encode_list(&records), encode_list(&records));
    }

    #[test]
    fn list_sheet_round_trips() {
        let records = vec![record(3, "Kita"), record(1, "Higashi")];
        let decoded = decode_list("matches", encode_list(&records)).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn header_only_sheet_is_empty() {
        assert!(decode_list("matches", Vec::new()).unwrap().is_empty());
        let header_only = vec![LIST_HEADER.map(String::from).to_vec()];
        assert!(decode_list("matches", header_only).unwrap().is_empty());
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let rows = vec![vec!["id".to_string(), "category".to_string()]];
        let err = decode_list("matches", rows).unwrap_err();
        assert!(matches!(err, StorageError::MalformedSchema { .. }));
    }

    #[test]
    fn bad_date_reports_the_row() {
        let mut rows = encode_list(&[record(1, "A")]);
        rows[1][2] = "someday".into();
        let err = decode_list("matches", rows).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut rows = encode_list(&[record(7, "first"), record(2, "B"), record(7, "second")]);
        rows[2][0] = " 2 ".into();
        let err = decode_list("matches", rows).unwrap_err();
        assert!(matches!(err, StorageError::MalformedSchema { .. }));
        assert!(err.to_string().contains("duplicate id 7 at row 4 (first at row 2)"));
    }

    #[tokio::test]
    async fn preparing_creates_missing_sheets_only() {
        let store = MemorySheetStore::new();
        let layout = SheetLayout::default();
        store.ensure_sheet(&layout.list, Some(list_header())).await.unwrap();
        store
            .write_table(&layout.list, encode_list(&[record(1, "kept")]))
            .await
            .unwrap();

        prepare_workbook(&store, &layout).await.unwrap();
        prepare_workbook(&store, &layout).await.unwrap();

        assert_eq!(store.read_table(&layout.list).await.unwrap().len(), 2);
        assert_eq!(store.read_table(&layout.media).await.unwrap(), [media_header()]);
        assert_eq!(store.read_cell(&layout.results, &layout.results_cell).await.unwrap(), None);
    }

    #[test]
    fn blank_results_cell_is_empty_map() {
        assert!(decode_results(None).unwrap().is_empty());
        assert!(decode_results(Some("  ")).unwrap().is_empty());
        assert!(decode_results(Some("{not json")).is_err());
    }

    #[test]
    fn results_blob_keeps_unicode_names() {
        let mut map = ResultMap::new();
        map.insert(result_key(2, 3), ResultEntry::new("1-1", "田中"));
        let text = encode_results(&map).unwrap();
        assert!(text.contains("田中"));
        assert_eq!(decode_results(Some(&text)).unwrap(), map);
    }

    #[test]
    fn short_scorer_lists_are_normalized_on_decode() {
        let map = decode_results(Some(r#"{"res_1_1":{"score":"0-0","scorers":["Ito"]}}"#)).unwrap();
        assert_eq!(map["res_1_1"].scorers.len(), 10);
    }

    #[test]
    fn media_rows_keep_their_sheet_index() {
        let rows = vec![
            media_header(),
            vec!["4".into(), "a.jpg".into(), "AAAA".into()],
            vec!["oops".into(), "b.jpg".into(), "BBBB".into()],
            vec!["5".into(), "c.jpg".into(), "CCCC".into()],
        ];
        let items = decode_media("media", rows);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].0, 1);
        assert_eq!(items[1].0, 3);
        assert_eq!(items[1].1.filename, "c.jpg");
    }
}
