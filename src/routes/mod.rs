use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod audit;
pub mod distribution;
pub mod documents;
pub mod health;
pub mod notifications;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let documents_routes = Router::new()
        .route(
            "/",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/:id/submit", post(documents::submit_document))
        .route("/:id/revisions", post(documents::create_revision))
        .route("/:id/status", post(documents::decide_revision))
        .route("/:id/force-status", post(documents::force_status))
        .route("/:id/next-revision", get(documents::next_revision))
        .route(
            "/:id/distribution-log",
            get(documents::list_distribution_log),
        );

    let notifications_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/:id/read", post(notifications::mark_read));

    let distribution_routes = Router::new().route(
        "/",
        get(distribution::list_rules).put(distribution::upsert_rule),
    );

    Router::new()
        .nest("/api/documents", documents_routes)
        .nest("/api/notifications", notifications_routes)
        .nest("/api/distribution-rules", distribution_routes)
        .route("/api/audit", get(audit::list_audit))
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
