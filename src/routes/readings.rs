use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::error::{map_db_error, AppResult};
use crate::services::readings_store::{Metric, StoredReading};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub(crate) struct CreateCelciusRequest {
    degrees: i32,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct CelciusResponse {
    id: i64,
    degrees: i32,
    created_at: String,
}

impl From<StoredReading> for CelciusResponse {
    fn from(row: StoredReading) -> Self {
        Self {
            id: row.id,
            degrees: row.value,
            created_at: row.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub(crate) struct CreateHumidityRequest {
    percent: i32,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct HumidityResponse {
    id: i64,
    percent: i32,
    created_at: String,
}

impl From<StoredReading> for HumidityResponse {
    fn from(row: StoredReading) -> Self {
        Self {
            id: row.id,
            percent: row.value,
            created_at: row.created_at.to_rfc3339(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared passthroughs
// ---------------------------------------------------------------------------

async fn insert(state: &AppState, metric: Metric, value: i32) -> AppResult<Json<SuccessResponse>> {
    state
        .readings
        .insert(metric, value)
        .await
        .map_err(map_db_error)?;
    tracing::debug!(%metric, value, "reading stored");
    Ok(SuccessResponse::ok())
}

async fn list<T: From<StoredReading>>(state: &AppState, metric: Metric) -> AppResult<Json<Vec<T>>> {
    let rows = state.readings.list(metric).await.map_err(map_db_error)?;
    Ok(Json(rows.into_iter().map(T::from).collect()))
}

async fn remove(state: &AppState, metric: Metric, id: i64) -> AppResult<Json<SuccessResponse>> {
    let deleted = state
        .readings
        .delete(metric, id)
        .await
        .map_err(map_db_error)?;
    tracing::debug!(%metric, id, deleted, "reading delete");
    Ok(SuccessResponse::ok())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/celcius",
    tag = "celcius",
    request_body = CreateCelciusRequest,
    responses(
        (status = 200, description = "Temperature reading stored", body = SuccessResponse),
        (status = 422, description = "Invalid body"),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn create_celcius(
    State(state): State<AppState>,
    Json(payload): Json<CreateCelciusRequest>,
) -> AppResult<Json<SuccessResponse>> {
    insert(&state, Metric::Celcius, payload.degrees).await
}

#[utoipa::path(
    get,
    path = "/celcius",
    tag = "celcius",
    responses(
        (status = 200, description = "All temperature readings, newest first", body = Vec<CelciusResponse>),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn list_celcius(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CelciusResponse>>> {
    list(&state, Metric::Celcius).await
}

#[utoipa::path(
    delete,
    path = "/celcius/{id}",
    tag = "celcius",
    params(("id" = i64, Path, description = "Reading id")),
    responses(
        (status = 200, description = "Delete issued; succeeds even when no row matched", body = SuccessResponse),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn delete_celcius(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    remove(&state, Metric::Celcius, id).await
}

#[utoipa::path(
    post,
    path = "/humidity",
    tag = "humidity",
    request_body = CreateHumidityRequest,
    responses(
        (status = 200, description = "Humidity reading stored", body = SuccessResponse),
        (status = 422, description = "Invalid body"),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn create_humidity(
    State(state): State<AppState>,
    Json(payload): Json<CreateHumidityRequest>,
) -> AppResult<Json<SuccessResponse>> {
    insert(&state, Metric::Humidity, payload.percent).await
}

#[utoipa::path(
    get,
    path = "/humidity",
    tag = "humidity",
    responses(
        (status = 200, description = "All humidity readings, newest first", body = Vec<HumidityResponse>),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn list_humidity(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<HumidityResponse>>> {
    list(&state, Metric::Humidity).await
}

#[utoipa::path(
    delete,
    path = "/humidity/{id}",
    tag = "humidity",
    params(("id" = i64, Path, description = "Reading id")),
    responses(
        (status = 200, description = "Delete issued; succeeds even when no row matched", body = SuccessResponse),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn delete_humidity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    remove(&state, Metric::Humidity, id).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/celcius", get(list_celcius).post(create_celcius))
        .route("/celcius/{id}", delete(delete_celcius))
        .route("/humidity", get(list_humidity).post(create_humidity))
        .route("/humidity/{id}", delete(delete_humidity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::readings_store::StoredReading;
    use chrono::{TimeZone, Utc};

    #[test]
    fn stored_rows_keep_their_column_names() {
        let row = StoredReading {
            id: 7,
            value: 23,
            created_at: Utc
                .with_ymd_and_hms(2024, 1, 1, 10, 15, 0)
                .single()
                .expect("ts"),
        };

        let celcius = serde_json::to_value(CelciusResponse::from(row.clone())).expect("json");
        assert_eq!(
            celcius,
            serde_json::json!({
                "id": 7,
                "degrees": 23,
                "created_at": "2024-01-01T10:15:00+00:00"
            })
        );

        let humidity = serde_json::to_value(HumidityResponse::from(row)).expect("json");
        assert_eq!(humidity["percent"], 23);
        assert!(humidity.get("degrees").is_none());
    }
}
