use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::sphere::Sphere;

/// Read-only view of a user goal, supplied by the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalSnapshot {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sphere: Option<Sphere>,
    pub status: GoalStatus,
    /// Completion percentage, 0-100.
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl GoalSnapshot {
    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum GoalStatus {
    Active,
    Completed,
    Paused,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "ACTIVE",
            GoalStatus::Completed => "COMPLETED",
            GoalStatus::Paused => "PAUSED",
            GoalStatus::Cancelled => "CANCELLED",
        }
    }
}

impl TryFrom<&str> for GoalStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ACTIVE" => Ok(GoalStatus::Active),
            "COMPLETED" => Ok(GoalStatus::Completed),
            "PAUSED" => Ok(GoalStatus::Paused),
            "CANCELLED" => Ok(GoalStatus::Cancelled),
            other => Err(format!("invalid goal status: {other}")),
        }
    }
}

/// Text progress bar, 20 cells wide, one cell per 5%.
pub fn progress_bar(progress: f64) -> String {
    let clamped = if progress.is_finite() {
        progress.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let filled = (clamped / 5.0).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled))
}
