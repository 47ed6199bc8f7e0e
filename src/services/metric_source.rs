use crate::error::AppResult;
use crate::models::analytics::DataSource;
use crate::models::metrics::DailyMetricRecord;
use crate::models::sphere::SphereWeights;
use crate::models::window::DateWindow;

/// Shared contract for the remote API and the local cache.
#[async_trait::async_trait]
pub trait MetricSource: Send + Sync {
    async fn fetch_metrics(
        &self,
        user_id: &str,
        window: &DateWindow,
    ) -> AppResult<Vec<DailyMetricRecord>>;

    /// `None` means the user never customized weights.
    async fn fetch_weights(&self, user_id: &str) -> AppResult<Option<SphereWeights>>;

    fn kind(&self) -> DataSource;
}
