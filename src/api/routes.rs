use crate::api::{auth, handlers, AppState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    // every advisory route goes through the auth middleware; the
    // fallbacks keep 405s inside the JSON error envelope
    let advisories = Router::new()
        .route(
            "/by-id/:publisher_namespace/:tracking_id",
            get(handlers::get_by_id).fallback(handlers::method_not_allowed),
        )
        .route(
            "/by-title/:title",
            get(handlers::get_by_title).fallback(handlers::method_not_allowed),
        )
        .route(
            "/by-publisher/:publisher_name",
            get(handlers::get_by_publisher).fallback(handlers::method_not_allowed),
        )
        .route(
            "/match-property",
            get(handlers::match_property).fallback(handlers::method_not_allowed),
        )
        .route(
            "/match-properties",
            post(handlers::match_properties).fallback(handlers::method_not_allowed),
        )
        .route(
            "/from-device-list",
            post(handlers::from_device_list).fallback(handlers::method_not_allowed),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        // Health endpoint
        .route("/health", get(handlers::health_check))
        // Query routes
        .nest("/v1/advisories", advisories)
        // Unknown routes answer through the error envelope
        .fallback(handlers::not_found)
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
}
