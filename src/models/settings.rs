use serde::{Deserialize, Serialize};

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_RULES_LOOKBACK_DAYS: u32 = 7;
pub const DEFAULT_REPORT_LOOKBACK_DAYS: u32 = 30;
pub const DEFAULT_CORRELATION_LOOKBACK_DAYS: u32 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_base_url: Option<String>,
    /// Masked when returned to callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_api_token: Option<String>,
    pub http_timeout_secs: u64,
    pub timezone: String,
    pub rules_lookback_days: u32,
    pub report_lookback_days: u32,
    pub correlation_lookback_days: u32,
    pub updated_at: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            remote_base_url: None,
            remote_api_token: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            timezone: DEFAULT_TIMEZONE.to_string(),
            rules_lookback_days: DEFAULT_RULES_LOOKBACK_DAYS,
            report_lookback_days: DEFAULT_REPORT_LOOKBACK_DAYS,
            correlation_lookback_days: DEFAULT_CORRELATION_LOOKBACK_DAYS,
            updated_at: String::new(),
        }
    }
}

/// Which operation a default window is resolved for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LookbackScope {
    Rules,
    Report,
    Correlations,
}

impl EngineSettings {
    pub fn lookback_days(&self, scope: LookbackScope) -> u32 {
        match scope {
            LookbackScope::Rules => self.rules_lookback_days,
            LookbackScope::Report => self.report_lookback_days,
            LookbackScope::Correlations => self.correlation_lookback_days,
        }
    }
}
