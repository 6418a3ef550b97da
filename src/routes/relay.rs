use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{map_db_error, AppError, AppResult};
use crate::routes::readings::SuccessResponse;
use crate::state::AppState;

// Relay rows are recorded as reported; AUTO/MANUAL behaviour lives on the device.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum RelayStatus {
    On,
    Off,
}

impl RelayStatus {
    fn as_str(self) -> &'static str {
        match self {
            RelayStatus::On => "ON",
            RelayStatus::Off => "OFF",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum RelayMode {
    Auto,
    Manual,
}

impl RelayMode {
    fn as_str(self) -> &'static str {
        match self {
            RelayMode::Auto => "AUTO",
            RelayMode::Manual => "MANUAL",
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub(crate) struct CreateRelayRequest {
    reported_status: RelayStatus,
    mode: RelayMode,
    /// RFC3339 timestamp.
    manual_since: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub(crate) struct UpdateRelayRequest {
    reported_status: Option<RelayStatus>,
    mode: Option<RelayMode>,
    /// RFC3339 timestamp.
    manual_since: Option<String>,
}

#[derive(sqlx::FromRow)]
struct RelayRow {
    id: i64,
    reported_status: String,
    mode: String,
    manual_since: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct RelayResponse {
    id: i64,
    reported_status: String,
    mode: String,
    manual_since: Option<String>,
    updated_at: String,
}

impl From<RelayRow> for RelayResponse {
    fn from(row: RelayRow) -> Self {
        Self {
            id: row.id,
            reported_status: row.reported_status,
            mode: row.mode,
            manual_since: row.manual_since.map(|ts| ts.to_rfc3339()),
            updated_at: row.updated_at.to_rfc3339(),
        }
    }
}

fn parse_manual_since(raw: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            DateTime::parse_from_rfc3339(value)
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|_| AppError::bad_request("manual_since must be RFC3339"))
        })
        .transpose()
}

#[utoipa::path(
    post,
    path = "/relay",
    tag = "relay",
    request_body = CreateRelayRequest,
    responses(
        (status = 200, description = "Relay state recorded", body = SuccessResponse),
        (status = 400, description = "Invalid manual_since", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid body"),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn create_relay(
    State(db): State<PgPool>,
    Json(payload): Json<CreateRelayRequest>,
) -> AppResult<Json<SuccessResponse>> {
    let manual_since = parse_manual_since(payload.manual_since.as_deref())?;

    sqlx::query(
        r#"
        INSERT INTO relay (reported_status, mode, manual_since)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(payload.reported_status.as_str())
    .bind(payload.mode.as_str())
    .bind(manual_since)
    .execute(&db)
    .await
    .map_err(map_db_error)?;

    Ok(Json(SuccessResponse { success: true }))
}

#[utoipa::path(
    get,
    path = "/relay",
    tag = "relay",
    responses(
        (status = 200, description = "All relay states, most recently updated first", body = Vec<RelayResponse>),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn list_relay(State(db): State<PgPool>) -> AppResult<Json<Vec<RelayResponse>>> {
    let rows: Vec<RelayRow> = sqlx::query_as(
        r#"
        SELECT id, reported_status, mode, manual_since, updated_at
        FROM relay
        ORDER BY updated_at DESC, id DESC
        "#,
    )
    .fetch_all(&db)
    .await
    .map_err(map_db_error)?;

    Ok(Json(rows.into_iter().map(RelayResponse::from).collect()))
}

#[utoipa::path(
    patch,
    path = "/relay/{id}",
    tag = "relay",
    request_body = UpdateRelayRequest,
    params(("id" = i64, Path, description = "Relay row id")),
    responses(
        (status = 200, description = "Relay state updated", body = SuccessResponse),
        (status = 400, description = "Invalid manual_since", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid body"),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn update_relay(
    State(db): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRelayRequest>,
) -> AppResult<Json<SuccessResponse>> {
    let manual_since = parse_manual_since(payload.manual_since.as_deref())?;

    let result = sqlx::query(
        r#"
        UPDATE relay
        SET reported_status = COALESCE($1, reported_status),
            mode = COALESCE($2, mode),
            manual_since = COALESCE($3, manual_since),
            updated_at = now()
        WHERE id = $4
        "#,
    )
    .bind(payload.reported_status.map(RelayStatus::as_str))
    .bind(payload.mode.map(RelayMode::as_str))
    .bind(manual_since)
    .bind(id)
    .execute(&db)
    .await
    .map_err(map_db_error)?;

    tracing::info!(
        relay_id = id,
        rows = result.rows_affected(),
        "relay state update"
    );
    Ok(Json(SuccessResponse { success: true }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/relay", get(list_relay).post(create_relay))
        .route("/relay/{id}", patch(update_relay))
}
