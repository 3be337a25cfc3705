use actix_web::{get, web, HttpRequest, HttpResponse};
use prometheus::{Encoder, TextEncoder};

use crate::AppState;

// Healthcheck endpoints
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

#[get("/ready")]
pub async fn ready() -> HttpResponse {
    HttpResponse::Ok().body("READY")
}

/// prometheus text format. `server.metrics_auth_token` 이 있으면 Bearer 토큰을 요구한다.
#[get("/metrics")]
pub async fn metrics_route(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if let Some(expected_token) = &state.settings.server.metrics_auth_token {
        let provided_token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "));

        if provided_token != Some(expected_token.as_str()) {
            return HttpResponse::Unauthorized().body("Unauthorized: Invalid or missing token");
        }
    }

    let metric_families = state.metrics_registry.gather();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(format!("Metrics encode error: {}", e));
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
