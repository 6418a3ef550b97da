use axum::extract::FromRef;
use sqlx::PgPool;

use crate::services::readings_store::PgReadingsStore;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub readings: PgReadingsStore,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        let readings = PgReadingsStore::new(db.clone());
        Self { db, readings }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.db.clone()
    }
}
