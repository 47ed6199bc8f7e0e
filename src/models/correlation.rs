use serde::{Deserialize, Serialize};

use crate::models::metrics::MetricField;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    WeakOrNone,
    ModeratePositive,
    ModerateNegative,
    StrongPositive,
    StrongNegative,
}

impl CorrelationStrength {
    pub fn classify(coefficient: f64) -> Self {
        let magnitude = coefficient.abs();
        if magnitude < 0.3 {
            CorrelationStrength::WeakOrNone
        } else if magnitude < 0.7 {
            if coefficient > 0.0 {
                CorrelationStrength::ModeratePositive
            } else {
                CorrelationStrength::ModerateNegative
            }
        } else if coefficient > 0.0 {
            CorrelationStrength::StrongPositive
        } else {
            CorrelationStrength::StrongNegative
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CorrelationStrength::WeakOrNone => "Weak or no correlation",
            CorrelationStrength::ModeratePositive => "Moderate positive correlation",
            CorrelationStrength::ModerateNegative => "Moderate negative correlation",
            CorrelationStrength::StrongPositive => "Strong positive correlation",
            CorrelationStrength::StrongNegative => "Strong negative correlation",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationResult {
    pub label: String,
    pub x_metric: MetricField,
    pub y_metric: MetricField,
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    pub interpretation: String,
    pub sample_size: usize,
}

impl CorrelationResult {
    pub fn is_significant(&self) -> bool {
        self.coefficient.abs() > 0.3
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationReport {
    pub correlations: Vec<CorrelationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CorrelationReport {
    pub fn significant(&self) -> Vec<&CorrelationResult> {
        self.correlations
            .iter()
            .filter(|result| result.is_significant())
            .collect()
    }
}
