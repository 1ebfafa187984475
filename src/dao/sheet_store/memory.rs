//! In-process workbook used for local runs and tests.

use std::{
    collections::HashMap,
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    sheet_store::{
        DEFAULT_CELL_CHAR_LIMIT, Row, SheetStore, check_cell_limit, grid_cell, resolve_address,
        set_grid_cell,
    },
    storage::{StorageError, StorageResult},
};

/// Workbook kept in memory with the same size limit as the hosted service.
#[derive(Clone)]
pub struct MemorySheetStore {
    sheets: Arc<RwLock<HashMap<String, Vec<Row>>>>,
    offline: Arc<AtomicBool>,
    cell_limit: usize,
}

impl Default for MemorySheetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySheetStore {
    /// Empty workbook with the default cell limit.
    pub fn new() -> Self {
        Self {
            sheets: Arc::new(RwLock::new(HashMap::new())),
            offline: Arc::new(AtomicBool::new(false)),
            cell_limit: DEFAULT_CELL_CHAR_LIMIT,
        }
    }

    /// Override the per-cell character limit.
    pub fn with_cell_limit(mut self, limit: usize) -> Self {
        self.cell_limit = limit;
        self
    }

    /// Simulate a network outage: every call fails until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                "in-memory workbook is offline".into(),
                io::Error::new(io::ErrorKind::NotConnected, "offline"),
            ));
        }
        Ok(())
    }
}

fn missing(sheet: &str) -> StorageError {
    StorageError::SheetNotFound {
        sheet: sheet.to_string(),
    }
}

impl SheetStore for MemorySheetStore {
    fn read_table(&self, sheet: &str) -> BoxFuture<'static, StorageResult<Vec<Row>>> {
        let store = self.clone();
        let sheet = sheet.to_string();
        Box::pin(async move {
            store.ensure_online()?;
            let guard = store.sheets.read().await;
            guard.get(&sheet).cloned().ok_or_else(|| missing(&sheet))
        })
    }

    fn write_table(&self, sheet: &str, rows: Vec<Row>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let sheet = sheet.to_string();
        Box::pin(async move {
            store.ensure_online()?;
            check_cell_limit(&sheet, rows.iter().flatten(), store.cell_limit)?;
            let mut guard = store.sheets.write().await;
            let slot = guard.get_mut(&sheet).ok_or_else(|| missing(&sheet))?;
            *slot = rows;
            Ok(())
        })
    }

    fn read_cell(&self, sheet: &str, addr: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        let sheet = sheet.to_string();
        let addr = addr.to_string();
        Box::pin(async move {
            store.ensure_online()?;
            let addr = resolve_address(&sheet, &addr)?;
            let guard = store.sheets.read().await;
            let rows = guard.get(&sheet).ok_or_else(|| missing(&sheet))?;
            Ok(grid_cell(rows, addr))
        })
    }

    fn write_cell(
        &self,
        sheet: &str,
        addr: &str,
        value: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let sheet = sheet.to_string();
        let addr = addr.to_string();
        Box::pin(async move {
            store.ensure_online()?;
            let addr = resolve_address(&sheet, &addr)?;
            check_cell_limit(&sheet, [&value], store.cell_limit)?;
            let mut guard = store.sheets.write().await;
            let rows = guard.get_mut(&sheet).ok_or_else(|| missing(&sheet))?;
            set_grid_cell(rows, addr, value);
            Ok(())
        })
    }

    fn append_row(&self, sheet: &str, row: Row) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let sheet = sheet.to_string();
        Box::pin(async move {
            store.ensure_online()?;
            check_cell_limit(&sheet, &row, store.cell_limit)?;
            let mut guard = store.sheets.write().await;
            let rows = guard.get_mut(&sheet).ok_or_else(|| missing(&sheet))?;
            rows.push(row);
            Ok(())
        })
    }

    fn delete_row(&self, sheet: &str, index: usize) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let sheet = sheet.to_string();
        Box::pin(async move {
            store.ensure_online()?;
            let mut guard = store.sheets.write().await;
            let rows = guard.get_mut(&sheet).ok_or_else(|| missing(&sheet))?;
            if index >= rows.len() {
                return Err(StorageError::RowOutOfRange {
                    sheet,
                    index,
                    len: rows.len(),
                });
            }
            rows.remove(index);
            Ok(())
        })
    }

    fn ensure_sheet(
        &self,
        sheet: &str,
        header: Option<Row>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let sheet = sheet.to_string();
        Box::pin(async move {
            store.ensure_online()?;
            let mut guard = store.sheets.write().await;
            guard
                .entry(sheet)
                .or_insert_with(|| header.into_iter().collect());
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online() })
    }
}
