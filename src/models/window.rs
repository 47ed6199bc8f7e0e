use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start > end {
            return Err(AppError::validation(format!(
                "window start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// The `days` calendar days ending on `end`. A zero-length request
    /// still covers `end` itself.
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: end - Duration::days(span),
            end,
        }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WindowPreset {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "week")]
    CurrentWeek,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
}

impl WindowPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowPreset::Today => "today",
            WindowPreset::CurrentWeek => "week",
            WindowPreset::Last7Days => "7d",
            WindowPreset::Last30Days => "30d",
            WindowPreset::Last90Days => "90d",
        }
    }

    pub fn resolve(&self, reference: NaiveDate) -> DateWindow {
        match self {
            WindowPreset::Today => DateWindow::single(reference),
            WindowPreset::CurrentWeek => {
                let offset = i64::from(reference.weekday().num_days_from_monday());
                let start = reference - Duration::days(offset);
                DateWindow {
                    start,
                    end: start + Duration::days(6),
                }
            }
            WindowPreset::Last7Days => DateWindow::trailing(reference, 7),
            WindowPreset::Last30Days => DateWindow::trailing(reference, 30),
            WindowPreset::Last90Days => DateWindow::trailing(reference, 90),
        }
    }
}

impl TryFrom<&str> for WindowPreset {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "today" => Ok(WindowPreset::Today),
            "week" => Ok(WindowPreset::CurrentWeek),
            "7d" => Ok(WindowPreset::Last7Days),
            "30d" => Ok(WindowPreset::Last30Days),
            "90d" => Ok(WindowPreset::Last90Days),
            other => Err(format!("unsupported window preset: {other}")),
        }
    }
}
