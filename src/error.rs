use std::fmt;

use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

/// Classification of a metric source fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Timeout,
    Unavailable,
    Unauthorized,
    InvalidResponse,
    Unknown,
}

impl SourceErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceErrorKind::Timeout => "SOURCE_TIMEOUT",
            SourceErrorKind::Unavailable => "SOURCE_UNAVAILABLE",
            SourceErrorKind::Unauthorized => "SOURCE_UNAUTHORIZED",
            SourceErrorKind::InvalidResponse => "SOURCE_INVALID_RESPONSE",
            SourceErrorKind::Unknown => "SOURCE_UNKNOWN",
        }
    }
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {message}")]
    Database { message: String },

    #[error("record not found")]
    NotFound,

    #[error("record conflict: {message}")]
    Conflict { message: String },

    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("rule {rule_id} could not be evaluated: {reason}")]
    RuleEvaluation { rule_id: String, reason: String },

    #[error("metric source failed ({kind}): {message}")]
    Source {
        kind: SourceErrorKind,
        message: String,
        correlation_id: Option<String>,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation { message }
    }

    pub fn rule_evaluation(rule_id: impl Into<String>, reason: impl Into<String>) -> Self {
        let rule_id = rule_id.into();
        let reason = reason.into();
        warn!(target: "app::engine::rules", %rule_id, %reason, "rule evaluation fault");
        AppError::RuleEvaluation { rule_id, reason }
    }

    pub fn source(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self::source_with_correlation(kind, message, None)
    }

    pub fn source_with_correlation(
        kind: SourceErrorKind,
        message: impl Into<String>,
        correlation_id: Option<&str>,
    ) -> Self {
        let message = message.into();
        let correlation = correlation_id.map(|value| value.to_string());
        match &correlation {
            Some(id) => {
                warn!(target: "app::sources", kind = %kind, correlation_id = %id, %message);
            }
            None => {
                warn!(target: "app::sources", kind = %kind, %message);
            }
        }

        AppError::Source {
            kind,
            message,
            correlation_id: correlation,
        }
    }

    pub fn source_kind(&self) -> Option<SourceErrorKind> {
        match self {
            AppError::Source { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::conflict", %message, "conflict error");
        AppError::Conflict { message }
    }

    pub fn not_found() -> Self {
        warn!(target: "app::database", "resource not found");
        AppError::NotFound
    }

    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::database", %message, "database error");
        AppError::Database { message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::Error::{QueryReturnedNoRows, SqliteFailure};
        use rusqlite::ErrorCode;

        match &error {
            QueryReturnedNoRows => AppError::not_found(),
            SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                AppError::conflict("unique or check constraint violated")
            }
            _ => {
                error!(target: "app::database", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            SourceErrorKind::Timeout
        } else if error.is_connect() || error.is_request() {
            SourceErrorKind::Unavailable
        } else if error.is_decode() || error.is_body() {
            SourceErrorKind::InvalidResponse
        } else {
            SourceErrorKind::Unknown
        };
        AppError::source(kind, error.to_string())
    }
}
