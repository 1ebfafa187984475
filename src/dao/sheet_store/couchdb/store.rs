use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::dao::{
    sheet_store::{
        Row, SheetStore, check_cell_limit, grid_cell, resolve_address, set_grid_cell,
    },
    storage::{StorageError, StorageResult},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{SheetDocument, sheet_doc_id},
};

/// Workbook hosted in a CouchDB database, one document per sheet.
///
/// Every mutation re-reads the sheet document and writes it back whole, so the
/// last writer wins exactly like the hosted spreadsheet service.
#[derive(Clone)]
pub struct CouchSheetStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
    cell_limit: usize,
}

impl CouchSheetStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
            cell_limit: config.cell_limit,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.authorized(self.client.request(method, url))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = format!("{}/{}", self.base_url, self.database);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorized(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::RevisionConflict {
                path: doc_id.to_string(),
            }),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn load_sheet(&self, title: &str) -> StorageResult<SheetDocument> {
        self.get_document::<SheetDocument>(&sheet_doc_id(title))
            .await?
            .ok_or_else(|| StorageError::SheetNotFound {
                sheet: title.to_string(),
            })
    }

    /// Read-modify-write of one sheet document.
    async fn modify_sheet<F>(&self, title: &str, change: F) -> StorageResult<()>
    where
        F: FnOnce(&mut Vec<Row>) -> StorageResult<()>,
    {
        let mut doc = self.load_sheet(title).await?;
        change(&mut doc.rows)?;
        self.put_document(&doc.id, &doc).await?;
        debug!(sheet = title, rows = doc.rows.len(), "sheet document written");
        Ok(())
    }
}

impl SheetStore for CouchSheetStore {
    fn read_table(&self, sheet: &str) -> BoxFuture<'static, StorageResult<Vec<Row>>> {
        let store = self.clone();
        let sheet = sheet.to_string();
        Box::pin(async move { Ok(store.load_sheet(&sheet).await?.rows) })
    }

    fn write_table(&self, sheet: &str, rows: Vec<Row>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let sheet = sheet.to_string();
        Box::pin(async move {
            check_cell_limit(&sheet, rows.iter().flatten(), store.cell_limit)?;
            store
                .modify_sheet(&sheet, move |current| {
                    *current = rows;
                    Ok(())
                })
                .await
        })
    }

    fn read_cell(&self, sheet: &str, addr: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        let sheet = sheet.to_string();
        let addr = addr.to_string();
        Box::pin(async move {
            let addr = resolve_address(&sheet, &addr)?;
            let doc = store.load_sheet(&sheet).await?;
            Ok(grid_cell(&doc.rows, addr))
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
            let addr = resolve_address(&sheet, &addr)?;
            check_cell_limit(&sheet, [&value], store.cell_limit)?;
            store
                .modify_sheet(&sheet, move |rows| {
                    set_grid_cell(rows, addr, value);
                    Ok(())
                })
                .await
        })
    }

    fn append_row(&self, sheet: &str, row: Row) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let sheet = sheet.to_string();
        Box::pin(async move {
            check_cell_limit(&sheet, &row, store.cell_limit)?;
            store
                .modify_sheet(&sheet, move |rows| {
                    rows.push(row);
                    Ok(())
                })
                .await
        })
    }

    fn delete_row(&self, sheet: &str, index: usize) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let sheet = sheet.to_string();
        Box::pin(async move {
            let name = sheet.clone();
            store
                .modify_sheet(&sheet, move |rows| {
                    if index >= rows.len() {
                        return Err(StorageError::RowOutOfRange {
                            sheet: name,
                            index,
                            len: rows.len(),
                        });
                    }
                    rows.remove(index);
                    Ok(())
                })
                .await
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
            let doc_id = sheet_doc_id(&sheet);
            if store
                .get_document::<SheetDocument>(&doc_id)
                .await?
                .is_some()
            {
                return Ok(());
            }
            let doc = SheetDocument::new(&sheet, header.into_iter().collect());
            match store.put_document(&doc_id, &doc).await {
                // Someone else created it first; that is the outcome we wanted.
                Err(CouchDaoError::RevisionConflict { .. }) => Ok(()),
                other => other.map_err(Into::into),
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = format!("{}/{}", store.base_url, store.database);
            let response = store
                .authorized(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
