use axum::{
    http::StatusCode,
    routing,
    Router,
    middleware as axum_middleware,
};
use tower::ServiceBuilder;

use crate::{
    Middleware::{rate_limit, set_cors_headers, set_security_headers},
    Response::{ServerResponse, status_response},
    State::AppState,
};

pub mod create;
pub mod list;
pub mod question;
pub mod publish;
pub mod stats;
pub mod facets;
pub mod author;
pub mod validate_step;
pub mod healthcheck;

async fn unknown_route() -> ServerResponse {
    status_response(StatusCode::NOT_FOUND, "Route not found")
}

/// Every question endpoint behind the rate limiter, plus the unlimited
/// health check. CORS and security headers are set on all responses.
pub fn router(appstate: AppState) -> Router {
    Router::new()
        .route("/api/questions", routing::get(list::request).post(create::request))
        .route("/api/questions/stats", routing::get(stats::request))
        .route("/api/questions/categories", routing::get(facets::categories))
        .route("/api/questions/tags", routing::get(facets::tags))
        .route("/api/questions/author/:email", routing::get(author::request))
        .route("/api/questions/validate/:step", routing::post(validate_step::request))
        .route("/api/questions/:id", routing::get(question::fetch).put(question::update).delete(question::delete))
        .route("/api/questions/:id/publish", routing::put(publish::publish))
        .route("/api/questions/:id/unpublish", routing::put(publish::unpublish))
        .route_layer(axum_middleware::from_fn_with_state(appstate.clone(), rate_limit::middleware))
        .route("/health", routing::get(healthcheck::request))
        .fallback(unknown_route)
        .layer(ServiceBuilder::new()
               .layer(axum_middleware::from_fn(set_cors_headers::middleware))
               .layer(axum_middleware::from_fn(set_security_headers::middleware))
            )
        .with_state(appstate)
}
