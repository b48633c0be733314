use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

/// Health check endpoint
///
/// Returns the current status of the API and timestamp. Unauthenticated,
/// informational only.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "service": "taskdeck",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Minimal liveness probe.
#[get("/health/status")]
pub async fn status() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok"
    }))
}
