// --- File: crates/services/bookwise_backend/src/app.rs ---
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use bookwise_booking::routes as booking_routes;
use bookwise_config::AppConfig;
use bookwise_db::SqlBookingRepository;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

async fn health(
    State(repository): State<Arc<SqlBookingRepository>>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = repository.db_client().is_healthy().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            status: if database { "ok" } else { "degraded" },
            database,
        }),
    )
}

/// The full HTTP application: every API route under `/api`, plus Swagger UI
/// at `/api/docs` when built with the `openapi` feature.
pub fn build_router(config: &AppConfig, repository: Arc<SqlBookingRepository>) -> Router {
    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Bookwise API!" }))
        .route("/health", get(health))
        .with_state(Arc::clone(&repository))
        .merge(booking_routes::routes(config, repository));

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    #[cfg(feature = "openapi")]
    {
        use bookwise_booking::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Bookwise API",
                version = "0.1.0",
                description = "Availability and booking endpoints",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            components(),
            tags( (name = "Bookwise", description = "Core service endpoints")),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        tracing::info!("Adding Swagger UI at /api/docs");
        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    app.layer(TraceLayer::new_for_http())
}
