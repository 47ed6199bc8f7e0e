use std::time::Duration as StdDuration;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult, SourceErrorKind};
use crate::models::analytics::DataSource;
use crate::models::metrics::{one_per_day, DailyMetricRecord};
use crate::models::settings::EngineSettings;
use crate::models::sphere::SphereWeights;
use crate::models::window::DateWindow;
use crate::services::metric_source::MetricSource;

/// Connection parameters for the remote metrics API.
#[derive(Debug, Clone)]
pub struct RemoteSourceConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub http_timeout: StdDuration,
    pub timezone: Tz,
}

impl RemoteSourceConfig {
    /// `None` when no base URL is configured.
    pub fn from_settings(settings: &EngineSettings) -> AppResult<Option<Self>> {
        let Some(base_url) = settings
            .remote_base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            return Ok(None);
        };

        Ok(Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: settings
                .remote_api_token
                .clone()
                .filter(|token| !token.trim().is_empty()),
            http_timeout: StdDuration::from_secs(settings.http_timeout_secs),
            timezone: parse_timezone(&settings.timezone)?,
        }))
    }
}

pub fn parse_timezone(value: &str) -> AppResult<Tz> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|err| AppError::validation(format!("unknown timezone {value}: {err}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricsEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    metrics: Vec<RemoteMetric>,
    #[serde(default)]
    count: Option<usize>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeightsEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    weights: Option<SphereWeights>,
    #[serde(default)]
    error: Option<String>,
}

/// Wire shape of one metric row. Dates arrive either as `YYYY-MM-DD` or as a
/// full RFC 3339 timestamp.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteMetric {
    date: String,
    #[serde(default)]
    sleep_hours: Option<f64>,
    #[serde(default)]
    water_ml: Option<f64>,
    #[serde(default)]
    calories: Option<f64>,
    #[serde(default)]
    protein_grams: Option<f64>,
    #[serde(default)]
    workout_minutes: Option<f64>,
    #[serde(default)]
    workout_type: Option<String>,
    #[serde(default)]
    work_hours: Option<f64>,
    #[serde(default)]
    income: Option<f64>,
    #[serde(default)]
    expenses: Option<f64>,
    #[serde(default)]
    mood: Option<f64>,
    #[serde(default)]
    self_dev_minutes: Option<f64>,
    #[serde(default)]
    personal_life_score: Option<f64>,
    #[serde(default)]
    notes: Option<String>,
}

impl RemoteMetric {
    fn into_record(self, timezone: Tz) -> AppResult<DailyMetricRecord> {
        Ok(DailyMetricRecord {
            date: parse_wire_date(&self.date, timezone)?,
            sleep_hours: self.sleep_hours,
            water_ml: self.water_ml,
            calories: self.calories,
            protein_grams: self.protein_grams,
            workout_minutes: self.workout_minutes,
            workout_type: self.workout_type,
            work_hours: self.work_hours,
            income: self.income,
            expenses: self.expenses,
            mood: self.mood,
            self_dev_minutes: self.self_dev_minutes,
            personal_life_score: self.personal_life_score,
            notes: self.notes,
        })
    }
}

/// Calendar day of a wire date in `timezone`.
pub fn parse_wire_date(value: &str, timezone: Tz) -> AppResult<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|instant| instant.with_timezone(&timezone).date_naive())
        .map_err(|err| {
            AppError::source(
                SourceErrorKind::InvalidResponse,
                format!("unrecognized metric date {trimmed}: {err}"),
            )
        })
}

/// HTTP adapter for the upstream metrics API.
pub struct RemoteMetricSource {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    timezone: Tz,
}

impl RemoteMetricSource {
    pub fn try_new(config: RemoteSourceConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Some(StdDuration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("failed to build metrics HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token,
            timezone: config.timezone,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        correlation_id: &str,
    ) -> AppResult<T> {
        let mut request = self.client.get(url).query(query);
        if let Some(token) = self.api_token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| Self::error_from_reqwest(err, correlation_id))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                target: "app::sources::remote",
                correlation_id = %correlation_id,
                status = status.as_u16(),
                url = %url,
                "remote metrics request failed"
            );
            return Err(Self::map_http_error(status, correlation_id));
        }

        let body = response
            .text()
            .await
            .map_err(|err| Self::error_from_reqwest(err, correlation_id))?;

        serde_json::from_str::<T>(&body).map_err(|err| {
            AppError::source_with_correlation(
                SourceErrorKind::InvalidResponse,
                format!("metrics API returned malformed JSON: {err}"),
                Some(correlation_id),
            )
        })
    }

    fn map_http_error(status: StatusCode, correlation_id: &str) -> AppError {
        match status {
            StatusCode::NOT_FOUND => AppError::not_found(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::source_with_correlation(
                SourceErrorKind::Unauthorized,
                format!("metrics API rejected credentials (status {})", status.as_u16()),
                Some(correlation_id),
            ),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                AppError::source_with_correlation(
                    SourceErrorKind::Timeout,
                    format!("metrics API timed out (status {})", status.as_u16()),
                    Some(correlation_id),
                )
            }
            status if status.is_server_error() => AppError::source_with_correlation(
                SourceErrorKind::Unavailable,
                format!("metrics API unavailable (status {})", status.as_u16()),
                Some(correlation_id),
            ),
            status => AppError::source_with_correlation(
                SourceErrorKind::Unknown,
                format!("metrics API returned status {}", status.as_u16()),
                Some(correlation_id),
            ),
        }
    }

    fn error_from_reqwest(err: reqwest::Error, correlation_id: &str) -> AppError {
        let kind = if err.is_timeout() {
            SourceErrorKind::Timeout
        } else if err.is_connect() || err.is_request() {
            SourceErrorKind::Unavailable
        } else if err.is_decode() || err.is_body() {
            SourceErrorKind::InvalidResponse
        } else {
            SourceErrorKind::Unknown
        };
        AppError::source_with_correlation(
            kind,
            format!("metrics API request failed: {err}"),
            Some(correlation_id),
        )
    }
}

#[async_trait::async_trait]
impl MetricSource for RemoteMetricSource {
    async fn fetch_metrics(
        &self,
        user_id: &str,
        window: &DateWindow,
    ) -> AppResult<Vec<DailyMetricRecord>> {
        let correlation_id = Uuid::new_v4().to_string();
        let url = format!("{}/api/metrics", self.base_url);
        let query = [
            ("userId", user_id.to_string()),
            ("from", window.start.to_string()),
            ("to", window.end.to_string()),
            ("limit", window.days().to_string()),
        ];

        debug!(
            target: "app::sources::remote",
            correlation_id = %correlation_id,
            user_id,
            start = %window.start,
            end = %window.end,
            "fetching remote metrics"
        );

        let envelope: MetricsEnvelope = self.get_json(&url, &query, &correlation_id).await?;
        if !envelope.success {
            return Err(AppError::source_with_correlation(
                SourceErrorKind::InvalidResponse,
                envelope
                    .error
                    .unwrap_or_else(|| "metrics API reported failure".to_string()),
                Some(correlation_id.as_str()),
            ));
        }

        if let Some(count) = envelope.count {
            if count != envelope.metrics.len() {
                warn!(
                    target: "app::sources::remote",
                    correlation_id = %correlation_id,
                    reported = count,
                    received = envelope.metrics.len(),
                    "metrics count mismatch"
                );
            }
        }

        let mut records = envelope
            .metrics
            .into_iter()
            .map(|metric| metric.into_record(self.timezone))
            .collect::<AppResult<Vec<_>>>()?;
        records.retain(|record| window.contains(record.date));
        for record in records.iter_mut() {
            let cleared = record.clear_out_of_range();
            if !cleared.is_empty() {
                debug!(
                    target: "app::sources::remote",
                    correlation_id = %correlation_id,
                    date = %record.date,
                    fields = ?cleared,
                    "out-of-range values treated as untracked"
                );
            }
        }
        let received = records.len();
        let records = one_per_day(records);
        if records.len() != received {
            warn!(
                target: "app::sources::remote",
                correlation_id = %correlation_id,
                received,
                kept = records.len(),
                "duplicate metric days collapsed"
            );
        }

        debug!(
            target: "app::sources::remote",
            correlation_id = %correlation_id,
            records = records.len(),
            "remote metrics loaded"
        );

        Ok(records)
    }

    async fn fetch_weights(&self, user_id: &str) -> AppResult<Option<SphereWeights>> {
        let correlation_id = Uuid::new_v4().to_string();
        let url = format!("{}/api/users/{}/weights", self.base_url, user_id);

        let envelope: WeightsEnvelope = self.get_json(&url, &[], &correlation_id).await?;
        if !envelope.success {
            return Err(AppError::source_with_correlation(
                SourceErrorKind::InvalidResponse,
                envelope
                    .error
                    .unwrap_or_else(|| "weights API reported failure".to_string()),
                Some(correlation_id.as_str()),
            ));
        }

        Ok(envelope.weights)
    }

    fn kind(&self) -> DataSource {
        DataSource::Remote
    }
}

pub mod testing {
    use super::*;

    /// Exposes HTTP status mapping to integration tests.
    pub fn map_http_error(status: StatusCode) -> AppError {
        RemoteMetricSource::map_http_error(status, "test-correlation-id")
    }

    pub fn source_for(base_url: &str, timeout: StdDuration) -> AppResult<RemoteMetricSource> {
        RemoteMetricSource::try_new(RemoteSourceConfig {
            base_url: base_url.to_string(),
            api_token: Some("test-token".to_string()),
            http_timeout: timeout,
            timezone: Tz::UTC,
        })
    }
}
