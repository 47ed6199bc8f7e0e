use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::sphere::Sphere;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SphereScore {
    pub score: f64,
    pub weight: f64,
    pub weighted_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LifeScoreBreakdown {
    pub total: f64,
    pub spheres: BTreeMap<Sphere, SphereScore>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Critical,
    Warning,
    Good,
    Excellent,
}

impl StatusLevel {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            StatusLevel::Excellent
        } else if percentage >= 70.0 {
            StatusLevel::Good
        } else if percentage >= 40.0 {
            StatusLevel::Warning
        } else {
            StatusLevel::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Critical => "critical",
            StatusLevel::Warning => "warning",
            StatusLevel::Good => "good",
            StatusLevel::Excellent => "excellent",
        }
    }

    pub fn color(&self) -> StatusColor {
        match self {
            StatusLevel::Critical => StatusColor::Red,
            StatusLevel::Warning => StatusColor::Yellow,
            StatusLevel::Good => StatusColor::Green,
            StatusLevel::Excellent => StatusColor::Blue,
        }
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Red,
    Yellow,
    Green,
    Blue,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SphereStatus {
    pub value: f64,
    pub target: f64,
    pub percentage: f64,
    pub status: StatusLevel,
    pub color: StatusColor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WheelSegment {
    pub value: f64,
    pub max: f64,
    pub percentage: f64,
}

/// Balance-wheel view: how full each sphere is relative to a display maximum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LifeWheel {
    pub spheres: BTreeMap<Sphere, WheelSegment>,
    pub overall_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LifeScorePoint {
    pub date: NaiveDate,
    pub score: f64,
}

/// Raw daily value of one sphere's driving metric. Untracked values read as 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub value: f64,
}
