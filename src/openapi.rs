use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::routes::{health, readings, relay, statistics};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "IoT Smart Humidifier API",
        version = "1.0.0",
        description = "Sensor ingest, relay state and dashboard statistics for the IoT smart humidifier"
    ),
    paths(
        health::index_handler,
        health::healthz_handler,
        readings::create_celcius,
        readings::list_celcius,
        readings::delete_celcius,
        readings::create_humidity,
        readings::list_humidity,
        readings::delete_humidity,
        relay::create_relay,
        relay::list_relay,
        relay::update_relay,
        statistics::get_statistics,
    ),
    components(schemas(
        ErrorResponse,
        health::HealthResponse,
        readings::SuccessResponse,
        readings::CreateCelciusRequest,
        readings::CelciusResponse,
        readings::CreateHumidityRequest,
        readings::HumidityResponse,
        relay::RelayStatus,
        relay::RelayMode,
        relay::CreateRelayRequest,
        relay::UpdateRelayRequest,
        relay::RelayResponse,
        statistics::RollupPointResponse,
        statistics::RollupSetResponse,
        statistics::StatisticsResponse,
    )),
    tags(
        (name = "health"),
        (name = "celcius", description = "Temperature readings"),
        (name = "humidity", description = "Humidity readings"),
        (name = "relay", description = "Reported relay state"),
        (name = "statistics", description = "Dashboard rollups")
    )
)]
pub struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to serialize openapi document");
        serde_json::Value::Null
    })
}

async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}
