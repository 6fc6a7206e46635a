use axum::{routing::get, routing::post, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;

use super::api::schedule as schedule_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/schedule", post(schedule_handlers::run_schedule))
        .route(
            "/api/schedule/validate",
            post(schedule_handlers::validate_catalog),
        )
        .route(
            "/api/schedule/latest",
            get(schedule_handlers::latest_report),
        )
        .route(
            "/api/schedule/latest/stations/{id}",
            get(schedule_handlers::latest_station),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    if config.api_keys.is_empty() {
        log::warn!("No API keys configured; every API request will be rejected");
    }

    let app = router(AppState::new(config));

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}
