use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::analytics::DataSource;
use crate::models::goal::GoalSnapshot;
use crate::models::life_score::LifeScoreBreakdown;
use crate::models::metrics::DailyMetricRecord;
use crate::models::recommendation::RuleAnalysis;
use crate::models::sphere::Sphere;
use crate::models::task::TaskSnapshot;
use crate::models::window::DateWindow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Csv,
    Text,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
            ReportFormat::Text => "text",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
            ReportFormat::Text => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Csv => "text/csv",
            ReportFormat::Text => "text/plain; charset=utf-8",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ReportFormat {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            "text" | "txt" => Ok(ReportFormat::Text),
            other => Err(format!("unsupported report format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Stable => "→",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayValue {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SphereReport {
    pub average: f64,
    pub trend: Trend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_day: Option<DayValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_day: Option<DayValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_progress: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub life_score: f64,
    pub total_days: usize,
    pub active_goals: usize,
    pub completed_goals: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub critical_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
}

/// Everything a report needs, computed once and rendered into any format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LifeReport {
    pub generated_at: String,
    pub period: DateWindow,
    pub summary: ReportSummary,
    pub life_score: LifeScoreBreakdown,
    pub analysis: RuleAnalysis,
    pub spheres: BTreeMap<Sphere, SphereReport>,
    pub goals: Vec<GoalSnapshot>,
    pub tasks: Vec<TaskSnapshot>,
    pub records: Vec<DailyMetricRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReport {
    pub format: ReportFormat,
    pub content: String,
    pub report: LifeReport,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportExportResult {
    pub file_path: String,
    pub format: ReportFormat,
    pub generated_at: String,
    pub checksum: String,
    pub data_source: DataSource,
}
