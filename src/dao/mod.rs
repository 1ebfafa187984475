/// Attachment rows of the media sheet.
pub mod media;
/// Persisted record definitions.
pub mod models;
/// Results blob access.
pub mod results;
/// Tabular backing store gateways.
pub mod sheet_store;
/// Layout of the list, results and media sheets.
pub mod sheets;
/// Storage abstraction layer for backing store operations.
pub mod storage;
