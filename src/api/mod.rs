use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, TextEncoder};

use crate::domain::order::{CreateOrder, Order, UpdateOrder};
use crate::metrics::Metrics;
use crate::service::{OrderService, OrderServiceError};

mod errors;

pub use errors::ApiError;

// ============================================================================
// HTTP API - order endpoints plus the /metrics and /health probes
// ============================================================================

pub struct AppState {
    pub service: Arc<OrderService>,
    pub metrics: Arc<Metrics>,
    pub request_timeout: Duration,
}

/// Register every route along with extractor error handlers that turn
/// malformed bodies and paths into `400` JSON errors.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .route("/order", web::post().to(create_order))
    .route("/order", web::put().to(update_order))
    .route("/order/{id}", web::delete().to(cancel_order))
    .route("/metrics", web::get().to(metrics_handler))
    .route("/health", web::get().to(health_handler));
}

/// Start the API server and block until it shuts down
pub async fn start_http_server(host: &str, port: u16, state: AppState) -> std::io::Result<()> {
    tracing::info!("🌐 Starting order API on http://{}:{}", host, port);

    let state = web::Data::new(state);
    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind((host, port))?
        .run()
        .await
}

async fn within_deadline<F>(timeout: Duration, operation: F) -> Result<Order, ApiError>
where
    F: Future<Output = Result<Order, OrderServiceError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Request deadline exceeded");
            Err(ApiError::Timeout)
        }
    }
}

async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrder>,
) -> Result<HttpResponse, ApiError> {
    let order = within_deadline(
        state.request_timeout,
        state.service.create_order(body.into_inner()),
    )
    .await?;

    Ok(HttpResponse::Created().json(order))
}

async fn update_order(
    state: web::Data<AppState>,
    body: web::Json<UpdateOrder>,
) -> Result<HttpResponse, ApiError> {
    let order = within_deadline(
        state.request_timeout,
        state.service.update_order(body.into_inner()),
    )
    .await?;

    Ok(HttpResponse::Ok().json(order))
}

async fn cancel_order(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let order = within_deadline(
        state.request_timeout,
        state.service.cancel_order(path.into_inner()),
    )
    .await?;

    Ok(HttpResponse::Ok().json(order))
}

async fn metrics_handler(state: web::Data<AppState>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "order-service"
    }))
}
