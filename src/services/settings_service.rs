use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use tracing::{info, warn};

use crate::db::repositories::settings_repository::{SettingRow, SettingsRepository};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::settings::EngineSettings;
use crate::services::remote_source::parse_timezone;

const KEY_REMOTE_BASE_URL: &str = "remote_base_url";
const KEY_REMOTE_API_TOKEN: &str = "remote_api_token";
const KEY_HTTP_TIMEOUT: &str = "http_timeout_secs";
const KEY_TIMEZONE: &str = "timezone";
const KEY_RULES_LOOKBACK: &str = "rules_lookback_days";
const KEY_REPORT_LOOKBACK: &str = "report_lookback_days";
const KEY_CORRELATION_LOOKBACK: &str = "correlation_lookback_days";

pub const ENV_REMOTE_BASE_URL: &str = "LIFEOS_REMOTE_BASE_URL";
pub const ENV_API_TOKEN: &str = "LIFEOS_API_TOKEN";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "LIFEOS_HTTP_TIMEOUT_SECS";
pub const ENV_TIMEZONE: &str = "LIFEOS_TIMEZONE";

const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=120;
const LOOKBACK_RANGE: std::ops::RangeInclusive<u32> = 1..=365;

/// Partial update. `Some(None)` clears an optional value.
#[derive(Debug, Default, Clone)]
pub struct SettingsUpdateInput {
    pub remote_base_url: Option<Option<String>>,
    pub remote_api_token: Option<Option<String>>,
    pub http_timeout_secs: Option<u64>,
    pub timezone: Option<String>,
    pub rules_lookback_days: Option<u32>,
    pub report_lookback_days: Option<u32>,
    pub correlation_lookback_days: Option<u32>,
}

/// Applies `LIFEOS_*` overrides read through `lookup` on top of `base`.
/// Unparsable values are logged and ignored.
pub fn apply_env_overrides<F>(mut base: EngineSettings, lookup: F) -> EngineSettings
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_REMOTE_BASE_URL).filter(|value| !value.trim().is_empty()) {
        base.remote_base_url = Some(url.trim().to_string());
    }
    if let Some(token) = lookup(ENV_API_TOKEN).filter(|value| !value.trim().is_empty()) {
        base.remote_api_token = Some(token.trim().to_string());
    }
    if let Some(raw) = lookup(ENV_HTTP_TIMEOUT_SECS) {
        match raw.trim().parse::<u64>() {
            Ok(secs) if TIMEOUT_RANGE.contains(&secs) => base.http_timeout_secs = secs,
            _ => warn!(
                target: "app::settings",
                key = ENV_HTTP_TIMEOUT_SECS,
                value = %raw,
                "ignoring invalid environment override"
            ),
        }
    }
    if let Some(raw) = lookup(ENV_TIMEZONE) {
        match parse_timezone(&raw) {
            Ok(tz) => base.timezone = tz.name().to_string(),
            Err(_) => warn!(
                target: "app::settings",
                key = ENV_TIMEZONE,
                value = %raw,
                "ignoring invalid environment override"
            ),
        }
    }
    base
}

pub fn settings_from_env() -> EngineSettings {
    apply_env_overrides(EngineSettings::default(), |key| std::env::var(key).ok())
}

pub struct SettingsService {
    db: DbPool,
    base: EngineSettings,
    cache: RwLock<Option<EngineSettings>>,
}

impl SettingsService {
    /// Defaults, then `LIFEOS_*` environment variables, then stored rows.
    pub fn new(db: DbPool) -> Self {
        Self::with_base(db, settings_from_env())
    }

    pub fn with_base(db: DbPool, base: EngineSettings) -> Self {
        Self {
            db,
            base,
            cache: RwLock::new(None),
        }
    }

    /// Settings as shown to callers, with the API token masked.
    pub fn get(&self) -> AppResult<EngineSettings> {
        let mut settings = self.effective()?;
        settings.remote_api_token = settings.remote_api_token.as_deref().map(mask_token);
        Ok(settings)
    }

    /// Unmasked settings for wiring adapters.
    pub fn effective(&self) -> AppResult<EngineSettings> {
        if let Ok(guard) = self.cache.read() {
            if let Some(settings) = guard.as_ref() {
                return Ok(settings.clone());
            }
        }

        let settings = self.load_settings_from_db()?;
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(settings.clone());
        }
        Ok(settings)
    }

    pub fn update(&self, input: SettingsUpdateInput) -> AppResult<EngineSettings> {
        let mut current = self.effective()?;
        let mut changes: Vec<(&str, Option<String>)> = Vec::new();

        if let Some(url) = input.remote_base_url {
            let url = url.map(|value| value.trim().to_string()).filter(|v| !v.is_empty());
            if let Some(value) = url.as_deref() {
                ensure_http_url(value)?;
            }
            changes.push((KEY_REMOTE_BASE_URL, url.clone()));
            current.remote_base_url = url;
        }

        if let Some(token) = input.remote_api_token {
            let token = token.map(|value| value.trim().to_string());
            if matches!(token.as_deref(), Some("")) {
                return Err(AppError::validation("API token must not be blank"));
            }
            changes.push((KEY_REMOTE_API_TOKEN, token.clone()));
            current.remote_api_token = token;
        }

        if let Some(secs) = input.http_timeout_secs {
            if !TIMEOUT_RANGE.contains(&secs) {
                return Err(AppError::validation(
                    "HTTP timeout must be between 1 and 120 seconds",
                ));
            }
            changes.push((KEY_HTTP_TIMEOUT, Some(secs.to_string())));
            current.http_timeout_secs = secs;
        }

        if let Some(timezone) = input.timezone {
            let tz = parse_timezone(&timezone)?;
            changes.push((KEY_TIMEZONE, Some(tz.name().to_string())));
            current.timezone = tz.name().to_string();
        }

        for (key, value, slot) in [
            (
                KEY_RULES_LOOKBACK,
                input.rules_lookback_days,
                &mut current.rules_lookback_days,
            ),
            (
                KEY_REPORT_LOOKBACK,
                input.report_lookback_days,
                &mut current.report_lookback_days,
            ),
            (
                KEY_CORRELATION_LOOKBACK,
                input.correlation_lookback_days,
                &mut current.correlation_lookback_days,
            ),
        ] {
            if let Some(days) = value {
                if !LOOKBACK_RANGE.contains(&days) {
                    return Err(AppError::validation(format!(
                        "{key} must be between 1 and 365 days"
                    )));
                }
                changes.push((key, Some(days.to_string())));
                *slot = days;
            }
        }

        self.db
            .with_connection(|conn| SettingsRepository::apply(conn, &changes))?;
        current.updated_at = Utc::now().to_rfc3339();

        info!(target: "app::settings", changed = changes.len(), "settings updated");

        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(current.clone());
        }

        let mut visible = current;
        visible.remote_api_token = visible.remote_api_token.as_deref().map(mask_token);
        Ok(visible)
    }

    fn load_settings_from_db(&self) -> AppResult<EngineSettings> {
        self.db.with_connection(|conn| {
            let rows = SettingsRepository::list(conn)?;
            let mut latest_updated_at: Option<String> = None;
            let mut map: HashMap<String, SettingRow> = HashMap::new();
            for row in rows {
                latest_updated_at = match latest_updated_at {
                    Some(ref current) if current >= &row.updated_at => Some(current.clone()),
                    _ => Some(row.updated_at.clone()),
                };
                map.insert(row.key.clone(), row);
            }

            let mut settings = self.base.clone();

            if let Some(row) = map.get(KEY_REMOTE_BASE_URL) {
                settings.remote_base_url = Some(row.value.clone());
            }
            if let Some(row) = map.get(KEY_REMOTE_API_TOKEN) {
                settings.remote_api_token = Some(row.value.clone());
            }
            if let Some(secs) = parsed(&map, KEY_HTTP_TIMEOUT) {
                settings.http_timeout_secs = secs;
            }
            if let Some(row) = map.get(KEY_TIMEZONE) {
                match parse_timezone(&row.value) {
                    Ok(tz) => settings.timezone = tz.name().to_string(),
                    Err(_) => warn!(
                        target: "app::settings",
                        value = %row.value,
                        "stored timezone invalid, keeping default"
                    ),
                }
            }
            if let Some(days) = parsed(&map, KEY_RULES_LOOKBACK) {
                settings.rules_lookback_days = days;
            }
            if let Some(days) = parsed(&map, KEY_REPORT_LOOKBACK) {
                settings.report_lookback_days = days;
            }
            if let Some(days) = parsed(&map, KEY_CORRELATION_LOOKBACK) {
                settings.correlation_lookback_days = days;
            }

            settings.updated_at = latest_updated_at.unwrap_or_else(|| Utc::now().to_rfc3339());
            Ok(settings)
        })
    }
}

fn parsed<T: std::str::FromStr>(map: &HashMap<String, SettingRow>, key: &str) -> Option<T> {
    let row = map.get(key)?;
    match row.value.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(target: "app::settings", key, value = %row.value, "stored setting unparsable");
            None
        }
    }
}

fn ensure_http_url(value: &str) -> AppResult<()> {
    let parsed = reqwest::Url::parse(value)
        .map_err(|err| AppError::validation(format!("remote base URL is invalid: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::validation("remote base URL must use http or https"));
    }
    Ok(())
}

pub fn mask_token(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
