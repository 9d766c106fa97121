use crate::handlers::{
    accounts::get_accounts,
    calculations::calculate_period,
    health::health_check,
    overrides::{delete_override, get_overrides, upsert_override},
    statements::get_statement,
    values::{get_period_values, purge_period_values, save_period_values},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Chart of accounts
        .route("/api/v1/accounts", get(get_accounts))
        // Monthly values and recalculation
        .route(
            "/api/v1/periods/:year/:month/values",
            get(get_period_values)
                .put(save_period_values)
                .delete(purge_period_values),
        )
        .route(
            "/api/v1/periods/:year/:month/calculate",
            post(calculate_period),
        )
        // Reports
        .route("/api/v1/statements/:kind/:year", get(get_statement))
        // Overrides
        .route("/api/v1/overrides", get(get_overrides).put(upsert_override))
        .route("/api/v1/overrides/:override_id", delete(delete_override))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
