//! Per-game results kept as one JSON object in a single cell of the results sheet.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    config::SheetLayout,
    dao::{
        models::{ResultEntry, ResultMap, result_key, result_key_prefix},
        sheet_store::SheetStore,
        sheets::{decode_results, encode_results},
        storage::{StorageError, StorageResult},
    },
};

/// Read-modify-write access to the results blob.
///
/// Every upsert re-reads the blob right before writing it back so that entries
/// stored by other sessions in the meantime survive. Two writers racing between
/// the read and the write still overwrite each other; the backing store offers no
/// compare-and-set.
#[derive(Clone)]
pub struct ResultBlobStore {
    store: Arc<dyn SheetStore>,
    sheet: String,
    cell: String,
}

impl ResultBlobStore {
    /// Blob stored at the results sheet and cell of `layout`.
    pub fn new(store: Arc<dyn SheetStore>, layout: &SheetLayout) -> Self {
        Self {
            store,
            sheet: layout.results.clone(),
            cell: layout.results_cell.clone(),
        }
    }

    /// Whole blob; a corrupt blob is reported and read as empty.
    pub async fn load_all(&self) -> StorageResult<ResultMap> {
        let raw = self.store.read_cell(&self.sheet, &self.cell).await?;
        match decode_results(raw.as_deref()) {
            Ok(map) => Ok(map),
            Err(err) => {
                warn!(
                    sheet = %self.sheet,
                    cell = %self.cell,
                    error = %err,
                    "results blob is not valid JSON; treating it as empty"
                );
                Ok(ResultMap::new())
            }
        }
    }

    /// Entries belonging to `match_id`, keyed by composite key.
    pub async fn load(&self, match_id: u32) -> StorageResult<ResultMap> {
        let prefix = result_key_prefix(match_id);
        let map = self.load_all().await?;
        Ok(map
            .into_iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .collect())
    }

    /// Store one game result, leaving every other key untouched.
    pub async fn upsert(
        &self,
        match_id: u32,
        game_index: u32,
        entry: ResultEntry,
    ) -> StorageResult<ResultEntry> {
        let mut map = self.load_all().await?;
        let key = result_key(match_id, game_index);
        map.insert(key.clone(), entry.clone());

        let encoded = encode_results(&map)
            .map_err(|err| StorageError::malformed(&self.sheet, err.to_string()))?;
        self.store
            .write_cell(&self.sheet, &self.cell, encoded)
            .await?;
        debug!(%key, entries = map.len(), "results blob updated");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{sheet_store::memory::MemorySheetStore, sheets::prepare_workbook};

    async fn blob(store: &MemorySheetStore) -> ResultBlobStore {
        let layout = SheetLayout::default();
        prepare_workbook(store, &layout).await.unwrap();
        ResultBlobStore::new(Arc::new(store.clone()), &layout)
    }

    #[tokio::test]
    async fn fresh_workbook_reads_empty() {
        let store = MemorySheetStore::new();
        let results = blob(&store).await;
        assert!(results.load(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unprepared_workbook_is_reported() {
        let store = MemorySheetStore::new();
        let results = ResultBlobStore::new(Arc::new(store), &SheetLayout::default());
        assert!(matches!(
            results.load_all().await,
            Err(StorageError::SheetNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn upsert_preserves_other_keys() {
        let store = MemorySheetStore::new();
        let results = blob(&store).await;
        results
            .upsert(7, 1, ResultEntry::new("1-0", "Sato"))
            .await
            .unwrap();
        results
            .upsert(8, 1, ResultEntry::new("0-0", ""))
            .await
            .unwrap();
        results
            .upsert(7, 2, ResultEntry::new("2-2", "Ito, Mori"))
            .await
            .unwrap();
        results
            .upsert(7, 1, ResultEntry::new("3-0", "Sato, Sato"))
            .await
            .unwrap();

        let all = results.load_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all["res_8_1"].score, "0-0");
        assert_eq!(all["res_7_1"].score, "3-0");
        assert_eq!(all["res_7_1"].scorers_text(), "Sato, Sato");

        let seven = results.load(7).await.unwrap();
        assert_eq!(seven.keys().collect::<Vec<_>>(), ["res_7_1", "res_7_2"]);
    }

    #[tokio::test]
    async fn prefix_filter_does_not_leak_longer_ids() {
        let store = MemorySheetStore::new();
        let results = blob(&store).await;
        results
            .upsert(1, 1, ResultEntry::new("1-0", ""))
            .await
            .unwrap();
        results
            .upsert(11, 1, ResultEntry::new("2-0", ""))
            .await
            .unwrap();
        let one = results.load(1).await.unwrap();
        assert_eq!(one.keys().collect::<Vec<_>>(), ["res_1_1"]);
    }

    #[tokio::test]
    async fn corrupt_blob_reads_as_empty_and_is_replaced() {
        let store = MemorySheetStore::new();
        let results = blob(&store).await;
        store
            .write_cell("results", "A2", "{not json".into())
            .await
            .unwrap();
        assert!(results.load_all().await.unwrap().is_empty());

        results
            .upsert(3, 4, ResultEntry::new("1-1", "Abe"))
            .await
            .unwrap();
        assert_eq!(results.load(3).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn outage_surfaces_as_storage_error() {
        let store = MemorySheetStore::new();
        let results = blob(&store).await;
        store.set_offline(true);
        assert!(matches!(
            results.upsert(1, 1, ResultEntry::empty()).await,
            Err(StorageError::Unavailable { .. })
        ));
    }
}
