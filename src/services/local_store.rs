use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::db::repositories::metrics_repository::MetricsRepository;
use crate::db::repositories::weights_repository::WeightsRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::analytics::DataSource;
use crate::models::metrics::DailyMetricRecord;
use crate::models::sphere::SphereWeights;
use crate::models::window::DateWindow;
use crate::services::metric_source::MetricSource;

/// SQLite-backed cache of daily metrics and sphere weights.
#[derive(Clone)]
pub struct LocalMetricStore {
    db: DbPool,
}

impl LocalMetricStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &DbPool {
        &self.db
    }

    pub fn upsert_metric(&self, user_id: &str, record: &DailyMetricRecord) -> AppResult<()> {
        ensure_user_id(user_id)?;
        record.validate()?;
        self.db
            .with_connection(|conn| MetricsRepository::upsert(conn, user_id, record, None))?;
        debug!(target: "app::sources::local", user_id, date = %record.date, "metric upserted");
        Ok(())
    }

    /// Replaces every cached record inside `window` with `records`.
    ///
    /// Records outside the window are skipped. Runs in a single transaction.
    pub fn replace_window(
        &self,
        user_id: &str,
        window: &DateWindow,
        records: &[DailyMetricRecord],
    ) -> AppResult<usize> {
        ensure_user_id(user_id)?;
        for record in records {
            record.validate()?;
        }

        let synced_at = Utc::now().to_rfc3339();
        let written = self.db.with_transaction(|tx| {
            MetricsRepository::delete_window(tx, user_id, window)?;
            let mut written = 0;
            for record in records.iter().filter(|record| window.contains(record.date)) {
                MetricsRepository::upsert(tx, user_id, record, Some(synced_at.as_str()))?;
                written += 1;
            }
            Ok(written)
        })?;

        info!(
            target: "app::sources::local",
            user_id,
            start = %window.start,
            end = %window.end,
            written,
            "cache window replaced"
        );
        Ok(written)
    }

    pub fn get_metric(&self, user_id: &str, date: NaiveDate) -> AppResult<DailyMetricRecord> {
        self.db
            .with_connection(|conn| MetricsRepository::find(conn, user_id, date))?
            .ok_or_else(AppError::not_found)
    }

    pub fn delete_metric(&self, user_id: &str, date: NaiveDate) -> AppResult<()> {
        let deleted = self
            .db
            .with_connection(|conn| MetricsRepository::delete(conn, user_id, date))?;
        if !deleted {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn save_weights(&self, user_id: &str, weights: &SphereWeights) -> AppResult<()> {
        ensure_user_id(user_id)?;
        weights.validate()?;
        self.db
            .with_connection(|conn| WeightsRepository::upsert(conn, user_id, weights))
    }

    pub fn load_metrics(
        &self,
        user_id: &str,
        window: &DateWindow,
    ) -> AppResult<Vec<DailyMetricRecord>> {
        self.db
            .with_connection(|conn| MetricsRepository::list_window(conn, user_id, window))
    }

    pub fn load_weights(&self, user_id: &str) -> AppResult<Option<SphereWeights>> {
        let row = self
            .db
            .with_connection(|conn| WeightsRepository::get(conn, user_id))?;
        Ok(row.map(|row| row.into_weights()))
    }
}

fn ensure_user_id(user_id: &str) -> AppResult<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::validation("user id must not be empty"));
    }
    Ok(())
}

#[async_trait::async_trait]
impl MetricSource for LocalMetricStore {
    async fn fetch_metrics(
        &self,
        user_id: &str,
        window: &DateWindow,
    ) -> AppResult<Vec<DailyMetricRecord>> {
        let store = self.clone();
        let user_id = user_id.to_string();
        let window = *window;
        let records = tokio::task::spawn_blocking(move || store.load_metrics(&user_id, &window))
            .await
            .map_err(|err| AppError::other(format!("local cache read aborted: {err}")))??;

        debug!(
            target: "app::sources::local",
            records = records.len(),
            start = %window.start,
            end = %window.end,
            "cached metrics loaded"
        );
        Ok(records)
    }

    async fn fetch_weights(&self, user_id: &str) -> AppResult<Option<SphereWeights>> {
        let store = self.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || store.load_weights(&user_id))
            .await
            .map_err(|err| AppError::other(format!("local cache read aborted: {err}")))?
    }

    fn kind(&self) -> DataSource {
        DataSource::LocalCache
    }
}
