use std::sync::Arc;

use anyhow::Context;

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::debates::{filter::ContentFilter, services::DebateService};
use crate::store::{postgres::PgStore, DebateStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DebateStore>,
    pub clock: Arc<dyn Clock>,
    pub debates: DebateService,
}

impl AppState {
    /// Connects to Postgres, runs migrations and wires the services.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let store = Arc::new(PgStore::new(db)) as Arc<dyn DebateStore>;
        Ok(Self::from_parts(config, store, Arc::new(SystemClock)))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn DebateStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let filter = ContentFilter::new(&config.banned_words);
        let debates = DebateService::new(store.clone(), filter, clock.clone());
        Self {
            config,
            store,
            clock,
            debates,
        }
    }

    /// State over an in-memory store with the given clock.
    #[cfg(test)]
    pub fn fake(clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(crate::store::memory::MemoryStore::new()) as Arc<dyn DebateStore>;
        Self::from_parts(Arc::new(AppConfig::for_tests()), store, clock)
    }
}
