pub mod health;
pub mod readings;
pub mod relay;
pub mod statistics;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(readings::router())
        .merge(relay::router())
        .merge(statistics::router())
        .merge(crate::openapi::router())
        .with_state(state)
}
