/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// List screen: master list loading, views and edit batches.
pub mod list_service;
/// Image normalisation and the budgeted JPEG encoding loop.
pub mod media_encoding;
/// Attachment upload, listing and deletion.
pub mod media_service;
/// Per-game results of the detail screen.
pub mod results_service;
/// Login, logout and screen navigation.
pub mod session_service;
/// Storage connection supervisor with degraded mode.
pub mod storage_supervisor;
