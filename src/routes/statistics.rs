use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use std::collections::BTreeMap;

use crate::error::AppResult;
use crate::services::readings_store::Metric;
use crate::services::statistics::{
    collect_statistics, RollupPoint, RollupSet, StatisticsResult, Window,
};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct RollupPointResponse {
    /// Bucket start: `YYYY-MM-DDTHH:00:00Z` for hourly buckets, `YYYY-MM-DD` for daily buckets.
    time: String,
    value: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct RollupSetResponse {
    /// Hourly averages over the last 24 hours.
    daily: Vec<RollupPointResponse>,
    /// Daily averages over the last 7 days.
    weekly: Vec<RollupPointResponse>,
    /// Daily averages over the last 30 days.
    monthly: Vec<RollupPointResponse>,
}

/// Rollups keyed by metric name (`celcius`, `humidity`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct StatisticsResponse(BTreeMap<String, RollupSetResponse>);

fn points(window: Window, points: &[RollupPoint]) -> Vec<RollupPointResponse> {
    let resolution = window.resolution();
    points
        .iter()
        .map(|point| RollupPointResponse {
            time: resolution.format_key(point.time),
            value: point.value,
        })
        .collect()
}

impl From<&RollupSet> for RollupSetResponse {
    fn from(set: &RollupSet) -> Self {
        Self {
            daily: points(Window::Day, &set.daily),
            weekly: points(Window::Week, &set.weekly),
            monthly: points(Window::Month, &set.monthly),
        }
    }
}

impl From<&StatisticsResult> for StatisticsResponse {
    fn from(result: &StatisticsResult) -> Self {
        Self(
            result
                .iter()
                .map(|(metric, set)| (metric.to_string(), RollupSetResponse::from(set)))
                .collect(),
        )
    }
}

#[utoipa::path(
    get,
    path = "/statistik",
    tag = "statistics",
    responses(
        (status = 200, description = "Hourly (24h), daily (7d) and daily (30d) averages per metric", body = StatisticsResponse),
        (status = 500, description = "Store failure", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn get_statistics(
    State(state): State<AppState>,
) -> AppResult<Json<StatisticsResponse>> {
    let now = Utc::now();
    let result = collect_statistics(&state.readings, &Metric::ALL, now).await?;
    Ok(Json(StatisticsResponse::from(&result)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/statistik", get(get_statistics))
}
