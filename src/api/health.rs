use actix_web::{HttpResponse, Responder};
use serde_json::json;

/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Service is up", body = Object, example = json!({"status": "ok"}))
    ),
    tag = "Health"
)]
pub async fn status() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
