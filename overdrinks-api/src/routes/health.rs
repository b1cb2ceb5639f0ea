use axum::Json;
use overdrinks_shared::types::api::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        "overdrinks-api",
        env!("CARGO_PKG_VERSION"),
    ))
}
