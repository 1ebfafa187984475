use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Matchbook backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::login,
        crate::routes::session::logout,
        crate::routes::session::screen,
        crate::routes::session::back,
        crate::routes::matches::list_matches,
        crate::routes::matches::apply_edits,
        crate::routes::matches::get_match,
        crate::routes::results::get_results,
        crate::routes::results::put_result,
        crate::routes::media::list_media,
        crate::routes::media::upload_media,
        crate::routes::media::delete_media,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::LoginRequest,
            crate::dto::session::LoginResponse,
            crate::dto::session::ScreenKind,
            crate::dto::session::ScreenResponse,
            crate::dto::matches::MatchSummary,
            crate::dto::matches::MatchRow,
            crate::dto::matches::ListViewResponse,
            crate::dto::matches::ActionInput,
            crate::dto::matches::ChangeInput,
            crate::dto::matches::EditBatchRequest,
            crate::dto::matches::EditBatchResponse,
            crate::dto::results::GameResultSlot,
            crate::dto::results::MatchResultsResponse,
            crate::dto::results::UpsertResultRequest,
            crate::dto::media::MediaItemResponse,
            crate::dto::media::MediaListResponse,
            crate::dto::media::EncodingAttemptResponse,
            crate::dto::media::UploadResponse,
            crate::dto::media::DeleteMediaRequest,
            crate::dao::models::Category,
            crate::dao::models::MatchField,
            crate::dao::models::ResultEntry,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Login and screen navigation"),
        (name = "matches", description = "Match list, filtering and edit batches"),
        (name = "results", description = "Per-game results of a match"),
        (name = "media", description = "Attachments of a match"),
    )
)]
/// OpenAPI document of every route.
pub struct ApiDoc;
