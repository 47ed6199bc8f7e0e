use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::life_score::SphereStatus;
use crate::models::sphere::Sphere;

/// Ordered most to least urgent, so `Ord` sorts CRITICAL first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::Warning => "🟡",
            Severity::Info => "🟢",
        }
    }

    /// Non-INFO findings claim their sphere for the rest of the pass.
    pub fn resolves_sphere(&self) -> bool {
        !matches!(self, Severity::Info)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Severity {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CRITICAL" => Ok(Severity::Critical),
            "WARNING" => Ok(Severity::Warning),
            "INFO" => Ok(Severity::Info),
            other => Err(format!("unsupported severity: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub sphere: Sphere,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleAnalysis {
    pub recommendations: Vec<Recommendation>,
    pub life_score: f64,
    pub sphere_statuses: BTreeMap<Sphere, SphereStatus>,
}

impl RuleAnalysis {
    pub fn count(&self, severity: Severity) -> usize {
        self.recommendations
            .iter()
            .filter(|rec| rec.severity == severity)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuleDescriptor {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub sphere: Sphere,
}
