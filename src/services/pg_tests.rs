use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use tower::ServiceExt;

use crate::services::readings_store::{Metric, PgReadingsStore, ReadingsStore};
use crate::services::statistics::{collect_statistics, Resolution};
use crate::state::AppState;

const SCHEMA_SQL: &str = include_str!("../../migrations/001_humidifier_schema.sql");

fn test_database_url() -> Option<String> {
    if env::var("HUMIDIFIER_INTEGRATION_TEST").ok().as_deref() != Some("1") {
        return None;
    }
    env::var("HUMIDIFIER_TEST_DATABASE_URL").ok()
}

async fn setup_test_pool(database_url: &str, schema: &str) -> Result<PgPool> {
    let admin_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;
    sqlx::query(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .execute(&admin_pool)
        .await?;
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin_pool)
        .await?;
    drop(admin_pool);

    let schema_name = schema.to_string();
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .after_connect(move |conn, _meta| {
            let schema = schema_name.clone();
            Box::pin(async move {
                sqlx::query(&format!("SET search_path TO {schema}"))
                    .execute(conn)
                    .await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await?;

    sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;
    Ok(pool)
}

async fn drop_schema(pool: PgPool, schema: &str) -> Result<()> {
    sqlx::query(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .execute(&pool)
        .await?;
    pool.close().await;
    Ok(())
}

async fn seed(
    pool: &PgPool,
    table: &str,
    column: &str,
    value: i32,
    at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO {table} ({column}, created_at) VALUES ($1, $2)"
    ))
    .bind(value)
    .bind(at)
    .execute(pool)
    .await?;
    Ok(())
}

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .expect("valid utc")
}

#[tokio::test]
async fn test_readings_store_insert_list_delete() -> Result<()> {
    let Some(database_url) = test_database_url() else {
        return Ok(());
    };
    let schema = format!("humidifier_store_{}", std::process::id());
    let pool = setup_test_pool(&database_url, &schema).await?;
    let store = PgReadingsStore::new(pool.clone());

    store.insert(Metric::Celcius, 21).await?;
    store.insert(Metric::Celcius, 23).await?;
    store.insert(Metric::Humidity, 55).await?;

    let celcius = store.list(Metric::Celcius).await?;
    assert_eq!(celcius.len(), 2);
    assert_eq!(celcius[0].value, 23);
    assert_eq!(store.list(Metric::Humidity).await?.len(), 1);

    let id = celcius[0].id;
    assert_eq!(store.delete(Metric::Celcius, id).await?, 1);
    assert_eq!(store.delete(Metric::Celcius, id).await?, 0);
    assert_eq!(store.list(Metric::Celcius).await?.len(), 1);

    drop_schema(pool, &schema).await
}

#[tokio::test]
async fn test_fetch_since_filters_and_orders() -> Result<()> {
    let Some(database_url) = test_database_url() else {
        return Ok(());
    };
    let schema = format!("humidifier_fetch_{}", std::process::id());
    let pool = setup_test_pool(&database_url, &schema).await?;
    let store = PgReadingsStore::new(pool.clone());

    seed(&pool, "humidity", "percent", 60, utc(2024, 1, 1, 11, 0)).await?;
    seed(&pool, "humidity", "percent", 40, utc(2024, 1, 1, 9, 0)).await?;
    seed(&pool, "humidity", "percent", 10, utc(2023, 11, 1, 9, 0)).await?;

    let readings = store
        .fetch_since(Metric::Humidity, utc(2024, 1, 1, 9, 0))
        .await?;
    let values: Vec<f64> = readings.iter().map(|r| r.value).collect();
    assert_eq!(values, vec![40.0, 60.0]);
    assert_eq!(readings[0].timestamp, utc(2024, 1, 1, 9, 0));

    drop_schema(pool, &schema).await
}

#[tokio::test]
async fn test_statistics_from_postgres() -> Result<()> {
    let Some(database_url) = test_database_url() else {
        return Ok(());
    };
    let schema = format!("humidifier_stats_{}", std::process::id());
    let pool = setup_test_pool(&database_url, &schema).await?;
    let store = PgReadingsStore::new(pool.clone());
    let now = utc(2024, 1, 1, 12, 0);

    seed(&pool, "celcius", "degrees", 20, utc(2024, 1, 1, 10, 15)).await?;
    seed(&pool, "celcius", "degrees", 24, utc(2024, 1, 1, 10, 45)).await?;
    seed(&pool, "celcius", "degrees", 30, utc(2023, 12, 28, 8, 0)).await?;
    seed(&pool, "celcius", "degrees", 99, utc(2023, 11, 1, 8, 0)).await?;
    seed(&pool, "humidity", "percent", 50, utc(2024, 1, 1, 11, 30)).await?;

    let result = collect_statistics(&store, &Metric::ALL, now).await?;

    let celcius = &result[&Metric::Celcius];
    assert_eq!(celcius.daily.len(), 1);
    assert_eq!(
        Resolution::Hourly.format_key(celcius.daily[0].time),
        "2024-01-01T10:00:00Z"
    );
    assert!((celcius.daily[0].value - 22.0).abs() < 1e-9);

    let weekly: Vec<(String, f64)> = celcius
        .weekly
        .iter()
        .map(|p| (Resolution::Daily.format_key(p.time), p.value))
        .collect();
    assert_eq!(
        weekly,
        vec![("2023-12-28".to_string(), 30.0), ("2024-01-01".to_string(), 22.0)]
    );
    assert_eq!(celcius.monthly, celcius.weekly);

    let humidity = &result[&Metric::Humidity];
    assert_eq!(humidity.daily.len(), 1);
    assert_eq!(
        Resolution::Hourly.format_key(humidity.daily[0].time),
        "2024-01-01T11:00:00Z"
    );

    drop_schema(pool, &schema).await
}

async fn send(
    pool: &PgPool,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Result<(StatusCode, serde_json::Value)> {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let resp = crate::routes::router(AppState::new(pool.clone()))
        .oneshot(request.body(body)?)
        .await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn test_unmatched_delete_and_patch_still_succeed() -> Result<()> {
    let Some(database_url) = test_database_url() else {
        return Ok(());
    };
    let schema = format!("humidifier_passthrough_{}", std::process::id());
    let pool = setup_test_pool(&database_url, &schema).await?;
    let success = serde_json::json!({ "success": true });

    let (status, body) = send(&pool, Method::DELETE, "/celcius/999", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, success);

    let (status, body) = send(&pool, Method::DELETE, "/humidity/999", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, success);

    let (status, body) = send(
        &pool,
        Method::PATCH,
        "/relay/999",
        Some(serde_json::json!({ "mode": "AUTO" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, success);

    drop_schema(pool, &schema).await
}

#[tokio::test]
async fn test_database_failures_pass_the_driver_message_through() -> Result<()> {
    let Some(database_url) = test_database_url() else {
        return Ok(());
    };
    let schema = format!("humidifier_dbfail_{}", std::process::id());
    let pool = setup_test_pool(&database_url, &schema).await?;
    sqlx::query("DROP TABLE celcius").execute(&pool).await?;

    let (status, body) = send(&pool, Method::GET, "/celcius", None).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap_or_default();
    assert!(message.contains("celcius"), "driver message kept: {message}");

    drop_schema(pool, &schema).await
}
