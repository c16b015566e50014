use axum::{
    routing::get,
    routing::post,
    Extension, Router,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::api::handlers::{health, ingestion};
use crate::openapi::configure_swagger_routes;

/// Create the application router
pub async fn create_app() -> Router {
    debug!("Creating application router");

    // Create the ingestion service using its factory function
    let ingestion_service = ingestion::create_service();

    // Create the health service using its factory function
    let health_service = health::create_health_service();

    // Set up the ingestion route
    let api_routes = Router::new()
        .route("/vitals/ingest", post(ingestion::ingest_vitals));

    debug!("API routes configured");

    // Set up public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .layer(Extension(health_service));

    debug!("Public routes configured");

    // Combine all routes
    let app = Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .with_state(ingestion_service)
        .layer(TraceLayer::new_for_http());

    // Configure the Swagger UI using the helper function
    let app = add_swagger_ui(app);

    debug!("Swagger UI merged");

    // Initialize health check service startup time
    health::initialize_server_start_time();

    app
}

/// Add Swagger UI to the router
pub fn add_swagger_ui(app: Router) -> Router {
    let swagger = configure_swagger_routes();
    app.merge(swagger)
}
