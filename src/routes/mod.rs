use axum::{Router, middleware};

use crate::state::SharedState;

/// OpenAPI document and Swagger UI.
pub mod docs;
/// Liveness endpoint.
pub mod health;
/// List screen endpoints.
pub mod matches;
/// Media screen endpoints.
pub mod media;
/// Detail screen endpoints.
pub mod results;
/// Login and navigation endpoints.
pub mod session;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let protected = session::router()
        .merge(matches::router())
        .merge(results::router())
        .merge(media::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    let api_router = health::router()
        .merge(session::public_router())
        .merge(protected);

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
