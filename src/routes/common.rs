//! Fixed-payload routes: greeting and health.

use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthBody {
    pub status: String,
}

/// The configured greeting.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is running", body = MessageBody))
)]
pub async fn root(greeting: Arc<str>) -> Json<MessageBody> {
    Json(MessageBody {
        message: greeting.to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Liveness probe", body = HealthBody))
)]
pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok".into() })
}
