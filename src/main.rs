use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use clap::Parser;
use humidifier_core::{cli, config, db, openapi, routes, state};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Failed to bind humidifier-core listener on {addr}: port already in use. Stop the other service using this port or re-run with --port to choose another port.",
            );
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to bind humidifier-core listener on {addr}"))
        }
    }
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let values = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("invalid CORS origin {origin:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(values)
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    if args.print_openapi {
        println!(
            "{}",
            serde_json::to_string_pretty(&openapi::openapi_json())?
        );
        return Ok(());
    }

    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config::CoreConfig::from_env()?;
    let pool = db::connect_lazy(&config)?;
    let cors = cors_layer(&config.cors_origins)?;

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .methods(vec![Method::POST, Method::PATCH, Method::DELETE])
            .use_headers()
            .finish()
            .context("failed to build rate limiter config")?,
    );
    let governor_limiter = governor_conf.limiter().clone();
    std::thread::spawn(move || loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
        governor_limiter.retain_recent();
    });

    let state = state::AppState::new(pool);
    let app = routes::router(state)
        .layer(GovernorLayer::new(governor_conf))
        .layer(cors);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = bind_listener(&addr).await?;
    tracing::info!(%addr, "humidifier-core listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
