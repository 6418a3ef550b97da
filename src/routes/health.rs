use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub const BANNER: &str = "IoT Smart Humidifier API";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Service banner", body = String))
)]
pub(crate) async fn index_handler() -> &'static str {
    BANNER
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses((status = 200, description = "OK", body = HealthResponse))
)]
pub(crate) async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index_handler))
        .route("/healthz", get(healthz_handler))
}
