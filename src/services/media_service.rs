//! Attachments of a match: listing, budgeted upload and deletion by payload.

use tokio::task;
use tracing::{debug, info, warn};

use crate::{
    dao::{media::MediaRepository, models::MediaItem},
    dto::media::{EncodingAttemptResponse, MediaItemResponse, MediaListResponse, UploadResponse},
    error::ServiceError,
    services::{
        list_service,
        media_encoding::{self, EncodedImage},
    },
    state::{SessionHandle, SharedState},
};

async fn repository(state: &SharedState) -> Result<MediaRepository, ServiceError> {
    let store = state.require_sheet_store().await?;
    Ok(MediaRepository::new(store, state.config().sheets.media.clone()))
}

/// Attachments stored for `match_id`.
pub async fn list(
    state: &SharedState,
    session: &SessionHandle,
    match_id: u32,
) -> Result<MediaListResponse, ServiceError> {
    let mut session = session.lock().await;
    list_service::loaded_match(state, &mut session, match_id).await?;
    let items = repository(state).await?.list(match_id).await?;
    Ok(MediaListResponse {
        match_id,
        budget: state.config().media.budget,
        items: items.into_iter().map(MediaItemResponse::from).collect(),
    })
}

/// Encode and store an upload.
///
/// Images go through the shrinking loop; when even the smallest attempt is over
/// budget nothing is stored unless `force` is set. Other files are stored as-is
/// only when their base64 text is already under budget. The session stays
/// locked until the row is appended.
pub async fn upload(
    state: &SharedState,
    session: &SessionHandle,
    match_id: u32,
    filename: String,
    bytes: Vec<u8>,
    force: bool,
) -> Result<UploadResponse, ServiceError> {
    let mut session = session.lock().await;
    list_service::loaded_match(state, &mut session, match_id).await?;
    if bytes.is_empty() {
        return Err(ServiceError::InvalidInput("upload body is empty".into()));
    }

    let repository = repository(state).await?;
    let budget = state.config().media.budget;

    if !media_encoding::is_image(&bytes) {
        let payload = media_encoding::encode_raw(&bytes);
        if payload.len() >= budget {
            return Err(ServiceError::PayloadTooLarge(format!(
                "`{filename}` is {} characters once encoded, budget is {budget}",
                payload.len()
            )));
        }
        let item = MediaItem::new(match_id, filename, payload);
        repository.append(&item).await?;
        info!(match_id, filename = %item.filename, encoded_size = item.encoded_size, "stored non-image attachment");
        return Ok(UploadResponse::Stored {
            item: item.into(),
            attempts: Vec::new(),
        });
    }

    let config = state.config().media;
    let encoded: EncodedImage = task::spawn_blocking(move || {
        let image = media_encoding::normalize(&bytes)?;
        media_encoding::encode_within_budget(&image, &config)
    })
    .await
    .map_err(|err| ServiceError::Internal(format!("encoding task failed: {err}")))?
    .map_err(|err| ServiceError::InvalidInput(format!("{err}: {}", error_chain(&err))))?;

    let attempts = encoded
        .attempts
        .iter()
        .copied()
        .map(EncodingAttemptResponse::from)
        .collect::<Vec<_>>();
    debug!(match_id, attempts = attempts.len(), fits = encoded.fits, "image encoded");

    if !encoded.fits && !force {
        warn!(
            match_id,
            filename = %filename,
            encoded_size = encoded.encoded_size(),
            budget,
            "image still over budget at the smallest setting; not stored"
        );
        return Ok(UploadResponse::Oversize {
            encoded_size: encoded.encoded_size(),
            budget,
            attempts,
        });
    }

    if !encoded.fits {
        warn!(
            match_id,
            filename = %filename,
            encoded_size = encoded.encoded_size(),
            budget,
            "storing over-budget image on request"
        );
    }
    let item = MediaItem::new(match_id, filename, encoded.payload);
    repository.append(&item).await?;
    info!(match_id, filename = %item.filename, encoded_size = item.encoded_size, "stored image attachment");
    Ok(UploadResponse::Stored {
        item: item.into(),
        attempts,
    })
}

/// Delete the first attachment of `match_id` whose payload equals `payload`.
pub async fn delete(
    state: &SharedState,
    session: &SessionHandle,
    match_id: u32,
    payload: &str,
) -> Result<(), ServiceError> {
    let mut session = session.lock().await;
    list_service::loaded_match(state, &mut session, match_id).await?;
    let removed = repository(state)
        .await?
        .delete_by_payload(match_id, payload)
        .await?;
    if removed {
        info!(match_id, "attachment deleted");
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!(
            "no attachment of match {match_id} with this payload"
        )))
    }
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes.join(": ")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::{AppConfig, Credentials, MediaEncodingConfig},
        dao::{
            sheet_store::{SheetStore, memory::MemorySheetStore},
            sheets::prepare_workbook,
        },
        state::AppState,
    };

    async fn setup(budget: usize) -> (SharedState, MemorySheetStore, SessionHandle) {
        let config = AppConfig {
            media: MediaEncodingConfig {
                budget,
                ..MediaEncodingConfig::default()
            },
            ..AppConfig::default()
        };
        let state = AppState::new(config, Credentials::new("coach", "secret"));
        let store = MemorySheetStore::new();
        prepare_workbook(&store, &state.config().sheets).await.unwrap();
        state.set_sheet_store(Arc::new(store.clone())).await;
        let session = state.session(state.open_session()).unwrap();
        (state, store, session)
    }

    #[tokio::test]
    async fn text_with_image_like_magic_is_stored_raw() {
        let (state, store, session) = setup(40_000).await;
        for (name, bytes) in [
            ("note.txt", b"P1 scored twice".to_vec()),
            ("scan.tif", b"II*\0 not really a tiff".to_vec()),
        ] {
            let response = upload(&state, &session, 2, name.into(), bytes, false)
                .await
                .unwrap();
            assert!(matches!(
                response,
                UploadResponse::Stored { ref attempts, .. } if attempts.is_empty()
            ));
        }

        let rows = store.read_table("media").await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][2], media_encoding::encode_raw(b"P1 scored twice"));
    }

    #[tokio::test]
    async fn empty_upload_is_invalid() {
        let (state, _, session) = setup(40_000).await;
        assert!(matches!(
            upload(&state, &session, 1, "a.txt".into(), Vec::new(), false).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let (state, _, session) = setup(40_000).await;
        assert!(matches!(
            list(&state, &session, 500).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            delete(&state, &session, 500, "AAAA").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
