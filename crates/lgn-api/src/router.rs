use axum::{Router, http::StatusCode, middleware, routing::get};

use crate::{
    auth,
    error::ApiError,
    metrics,
    middleware::{request_id, security_headers},
    signin,
    state::ApiState,
};

/// Routes of the API, without the cross-cutting layers
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health))
        .merge(signin::routes())
        .merge(auth::routes())
        .fallback(handler_404)
}

/// The complete application: routes, request IDs, metrics and security
/// headers, bound to `state`
pub fn app(state: ApiState) -> Router {
    let environment = state.environment;

    let app = router()
        .route_layer(middleware::from_fn(metrics::track_metrics))
        .with_state(state);

    security_headers::apply_security_headers(app, environment)
        .layer(middleware::from_fn(request_id::request_id_middleware))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn handler_404() -> ApiError {
    ApiError::NotFound
}
