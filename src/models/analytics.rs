use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::life_score::{LifeScoreBreakdown, LifeWheel};
use crate::models::recommendation::{Recommendation, RuleAnalysis};

/// Which adapter produced the records behind a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Remote,
    LocalCache,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Remote => "remote",
            DataSource::LocalCache => "local_cache",
        }
    }
}

/// A computed payload tagged with its data source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sourced<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> Sourced<T> {
    pub fn new(data: T, source: DataSource) -> Self {
        Self { data, source }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            data: f(self.data),
            source: self.source,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalsOverview {
    pub active: usize,
    pub average_progress: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TasksOverview {
    pub pending: usize,
    pub critical: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub reference_date: NaiveDate,
    pub today: LifeScoreBreakdown,
    pub weekly: RuleAnalysis,
    pub top_recommendations: Vec<Recommendation>,
    pub goals: GoalsOverview,
    pub tasks: TasksOverview,
    pub wheel: LifeWheel,
    pub generated_at: String,
}
