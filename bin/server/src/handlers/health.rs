use actix_web::{get, HttpResponse};
use common::HealthResponse;

/// Liveness check polled by deployments and the e2e harness
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}
