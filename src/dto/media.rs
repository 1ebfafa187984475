use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::MediaItem, dto::validation::validate_filename,
    services::media_encoding::EncodingAttempt,
};

/// Stored attachment.
#[derive(Debug, Serialize, ToSchema)]
pub struct MediaItemResponse {
    /// Name given at upload.
    pub filename: String,
    /// Base64 payload as stored in the media sheet.
    pub encoded_payload: String,
    /// Length of `encoded_payload`.
    pub encoded_size: usize,
}

impl From<MediaItem> for MediaItemResponse {
    fn from(item: MediaItem) -> Self {
        Self {
            filename: item.filename,
            encoded_payload: item.encoded_payload,
            encoded_size: item.encoded_size,
        }
    }
}

/// Media screen content.
#[derive(Debug, Serialize, ToSchema)]
pub struct MediaListResponse {
    /// Match the attachments belong to.
    pub match_id: u32,
    /// Size budget applied to new uploads.
    pub budget: usize,
    /// Attachments in upload order.
    pub items: Vec<MediaItemResponse>,
}

/// Query string of an upload; the request body carries the raw file bytes.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct UploadParams {
    /// Name stored next to the payload.
    #[validate(custom(function = validate_filename))]
    pub filename: String,
    /// Store the best attempt even when it exceeds the budget.
    #[serde(default)]
    pub force: bool,
}

/// One pass of the shrinking loop.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct EncodingAttemptResponse {
    /// Bounding box side.
    pub width: u32,
    /// JPEG quality.
    pub quality: u8,
    /// Base64 length produced.
    pub encoded_size: usize,
}

impl From<EncodingAttempt> for EncodingAttemptResponse {
    fn from(attempt: EncodingAttempt) -> Self {
        Self {
            width: attempt.width,
            quality: attempt.quality,
            encoded_size: attempt.encoded_size,
        }
    }
}

/// Upload outcome.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadResponse {
    /// The payload was appended to the media sheet.
    Stored {
        /// The stored row.
        item: MediaItemResponse,
        /// Encoding attempts; empty for files stored as-is.
        attempts: Vec<EncodingAttemptResponse>,
    },
    /// Nothing was stored: the smallest attempt still exceeds the budget.
    Oversize {
        /// Size of the smallest attempt.
        encoded_size: usize,
        /// Budget it had to stay under.
        budget: usize,
        /// Every attempt, the last one being the smallest.
        attempts: Vec<EncodingAttemptResponse>,
    },
}

/// Identifies the attachment to delete by its exact payload.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DeleteMediaRequest {
    /// Payload of the attachment, as listed.
    #[validate(length(min = 1))]
    pub encoded_payload: String,
}
