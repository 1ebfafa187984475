//! Attachment rows of the media sheet: `matchId | filename | encodedPayload`.

use std::sync::Arc;

use tracing::debug;

use crate::dao::{
    models::MediaItem,
    sheet_store::SheetStore,
    sheets::{decode_media, encode_media_row},
    storage::StorageResult,
};

/// Reads and writes attachment rows of the media sheet.
#[derive(Clone)]
pub struct MediaRepository {
    store: Arc<dyn SheetStore>,
    sheet: String,
}

impl MediaRepository {
    /// Repository over `sheet` of `store`.
    pub fn new(store: Arc<dyn SheetStore>, sheet: impl Into<String>) -> Self {
        Self {
            store,
            sheet: sheet.into(),
        }
    }

    /// Attachments of `match_id`, in sheet order.
    pub async fn list(&self, match_id: u32) -> StorageResult<Vec<MediaItem>> {
        let rows = self.store.read_table(&self.sheet).await?;
        Ok(decode_media(&self.sheet, rows)
            .into_iter()
            .map(|(_, item)| item)
            .filter(|item| item.match_id == match_id)
            .collect())
    }

    /// Add `item` after the last row.
    pub async fn append(&self, item: &MediaItem) -> StorageResult<()> {
        self.store
            .append_row(&self.sheet, encode_media_row(item))
            .await?;
        debug!(
            match_id = item.match_id,
            filename = %item.filename,
            encoded_size = item.encoded_size,
            "media row appended"
        );
        Ok(())
    }

    /// Remove the first row of `match_id` carrying exactly `payload`.
    ///
    /// Returns `false` when no such row exists. The row index is looked up right
    /// before deleting, a concurrent delete in between can still shift it.
    pub async fn delete_by_payload(&self, match_id: u32, payload: &str) -> StorageResult<bool> {
        let rows = self.store.read_table(&self.sheet).await?;
        let target = decode_media(&self.sheet, rows)
            .into_iter()
            .find(|(_, item)| item.match_id == match_id && item.encoded_payload == payload)
            .map(|(index, _)| index);

        match target {
            Some(index) => {
                self.store.delete_row(&self.sheet, index).await?;
                debug!(match_id, index, "media row deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
