use crate::config::CoreConfig;
use crate::db;
use crate::state::AppState;
use std::time::Duration;

pub fn test_config() -> CoreConfig {
    CoreConfig {
        database_url: "postgresql://postgres@localhost/postgres".to_string(),
        db_max_connections: 2,
        db_acquire_timeout: Duration::from_secs(1),
        cors_origins: Vec::new(),
        rate_limit_per_second: 20,
        rate_limit_burst: 60,
    }
}

pub fn test_state() -> AppState {
    let config = test_config();
    let pool = db::connect_lazy(&config).expect("connect_lazy");
    AppState::new(pool)
}
