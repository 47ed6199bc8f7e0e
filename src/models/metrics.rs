use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::window::DateWindow;

/// One user's measurements for a single calendar day.
///
/// `None` means the value was not tracked that day, which is different from
/// a tracked zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetricRecord {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_ml: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_grams: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expenses: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_dev_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_life_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DailyMetricRecord {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            sleep_hours: None,
            water_ml: None,
            calories: None,
            protein_grams: None,
            workout_minutes: None,
            workout_type: None,
            work_hours: None,
            income: None,
            expenses: None,
            mood: None,
            self_dev_minutes: None,
            personal_life_score: None,
            notes: None,
        }
    }

    pub fn value(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::SleepHours => self.sleep_hours,
            MetricField::WaterMl => self.water_ml,
            MetricField::Calories => self.calories,
            MetricField::ProteinGrams => self.protein_grams,
            MetricField::WorkoutMinutes => self.workout_minutes,
            MetricField::WorkHours => self.work_hours,
            MetricField::Income => self.income,
            MetricField::Expenses => self.expenses,
            MetricField::Mood => self.mood,
            MetricField::SelfDevMinutes => self.self_dev_minutes,
            MetricField::PersonalLifeScore => self.personal_life_score,
        }
    }

    /// A day with no numeric measurement at all is treated as untracked.
    pub fn is_tracked(&self) -> bool {
        MetricField::ALL
            .iter()
            .any(|field| self.value(*field).is_some())
    }

    pub fn validate(&self) -> AppResult<()> {
        for field in MetricField::ALL {
            let Some(value) = self.value(field) else {
                continue;
            };
            if !value.is_finite() {
                return Err(AppError::validation(format!(
                    "{field} on {} must be a finite number",
                    self.date
                )));
            }
            let (lower, upper) = field.bounds();
            if value < lower || value > upper {
                return Err(AppError::validation(format!(
                    "{field} on {} must be between {lower} and {upper}, got {value}",
                    self.date
                )));
            }
        }
        Ok(())
    }

    /// Clears every value that [`validate`](Self::validate) would reject and
    /// returns the fields that were cleared. Ratings of `0` are how some
    /// clients encode "not rated", so they become untracked.
    pub fn clear_out_of_range(&mut self) -> Vec<MetricField> {
        let mut cleared = Vec::new();
        for field in MetricField::ALL {
            let Some(value) = self.value(field) else {
                continue;
            };
            let (lower, upper) = field.bounds();
            if !value.is_finite() || value < lower || value > upper {
                *self.slot(field) = None;
                cleared.push(field);
            }
        }
        cleared
    }

    fn slot(&mut self, field: MetricField) -> &mut Option<f64> {
        match field {
            MetricField::SleepHours => &mut self.sleep_hours,
            MetricField::WaterMl => &mut self.water_ml,
            MetricField::Calories => &mut self.calories,
            MetricField::ProteinGrams => &mut self.protein_grams,
            MetricField::WorkoutMinutes => &mut self.workout_minutes,
            MetricField::WorkHours => &mut self.work_hours,
            MetricField::Income => &mut self.income,
            MetricField::Expenses => &mut self.expenses,
            MetricField::Mood => &mut self.mood,
            MetricField::SelfDevMinutes => &mut self.self_dev_minutes,
            MetricField::PersonalLifeScore => &mut self.personal_life_score,
        }
    }
}

/// Numeric columns of a [`DailyMetricRecord`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum MetricField {
    SleepHours,
    WaterMl,
    Calories,
    ProteinGrams,
    WorkoutMinutes,
    WorkHours,
    Income,
    Expenses,
    Mood,
    SelfDevMinutes,
    PersonalLifeScore,
}

impl MetricField {
    pub const ALL: [MetricField; 11] = [
        MetricField::SleepHours,
        MetricField::WaterMl,
        MetricField::Calories,
        MetricField::ProteinGrams,
        MetricField::WorkoutMinutes,
        MetricField::WorkHours,
        MetricField::Income,
        MetricField::Expenses,
        MetricField::Mood,
        MetricField::SelfDevMinutes,
        MetricField::PersonalLifeScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::SleepHours => "sleep_hours",
            MetricField::WaterMl => "water_ml",
            MetricField::Calories => "calories",
            MetricField::ProteinGrams => "protein_grams",
            MetricField::WorkoutMinutes => "workout_minutes",
            MetricField::WorkHours => "work_hours",
            MetricField::Income => "income",
            MetricField::Expenses => "expenses",
            MetricField::Mood => "mood",
            MetricField::SelfDevMinutes => "self_dev_minutes",
            MetricField::PersonalLifeScore => "personal_life_score",
        }
    }

    /// Accepted range for a single day's value.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            MetricField::SleepHours | MetricField::WorkHours => (0.0, 24.0),
            MetricField::Mood | MetricField::PersonalLifeScore => (1.0, 10.0),
            MetricField::WorkoutMinutes | MetricField::SelfDevMinutes => (0.0, 1440.0),
            _ => (0.0, f64::MAX),
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sorts by date and keeps only tracked records.
pub fn tracked_in_order<'a, I>(records: I) -> Vec<&'a DailyMetricRecord>
where
    I: IntoIterator<Item = &'a DailyMetricRecord>,
{
    let mut tracked: Vec<&DailyMetricRecord> =
        records.into_iter().filter(|r| r.is_tracked()).collect();
    tracked.sort_by_key(|record| record.date);
    tracked
}

/// Tracked records inside `window`, sorted by date with one record per day.
/// When a day appears twice the first occurrence wins.
pub fn tracked_in_window<'a>(
    records: &'a [DailyMetricRecord],
    window: &DateWindow,
) -> Vec<&'a DailyMetricRecord> {
    let mut tracked = tracked_in_order(records.iter().filter(|r| window.contains(r.date)));
    tracked.dedup_by_key(|record| record.date);
    tracked
}

/// Sorts owned records by date and keeps one record per day, choosing the
/// same record [`tracked_in_window`] would: the first tracked one, or the
/// first one when none of that day's records is tracked.
pub fn one_per_day(mut records: Vec<DailyMetricRecord>) -> Vec<DailyMetricRecord> {
    records.sort_by_key(|record| record.date);
    let mut kept: Vec<DailyMetricRecord> = Vec::with_capacity(records.len());
    for record in records {
        match kept.last_mut() {
            Some(last) if last.date == record.date => {
                if !last.is_tracked() && record.is_tracked() {
                    *last = record;
                }
            }
            _ => kept.push(record),
        }
    }
    kept
}

/// Present values of `field` across `records`, in the given order.
pub fn present_values(records: &[&DailyMetricRecord], field: MetricField) -> Vec<f64> {
    records
        .iter()
        .filter_map(|record| record.value(field))
        .collect()
}
