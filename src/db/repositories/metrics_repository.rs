use std::convert::TryFrom;

use chrono::NaiveDate;
use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::metrics::DailyMetricRecord;
use crate::models::window::DateWindow;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str = r#"
    SELECT
        date,
        sleep_hours,
        water_ml,
        calories,
        protein_grams,
        workout_minutes,
        workout_type,
        work_hours,
        income,
        expenses,
        mood,
        self_dev_minutes,
        personal_life_score,
        notes
    FROM daily_metrics
"#;

#[derive(Debug, Clone)]
pub struct DailyMetricRow {
    pub date: String,
    pub sleep_hours: Option<f64>,
    pub water_ml: Option<f64>,
    pub calories: Option<f64>,
    pub protein_grams: Option<f64>,
    pub workout_minutes: Option<f64>,
    pub workout_type: Option<String>,
    pub work_hours: Option<f64>,
    pub income: Option<f64>,
    pub expenses: Option<f64>,
    pub mood: Option<f64>,
    pub self_dev_minutes: Option<f64>,
    pub personal_life_score: Option<f64>,
    pub notes: Option<String>,
}

impl DailyMetricRow {
    pub fn from_record(record: &DailyMetricRecord) -> Self {
        Self {
            date: record.date.format(DATE_FORMAT).to_string(),
            sleep_hours: record.sleep_hours,
            water_ml: record.water_ml,
            calories: record.calories,
            protein_grams: record.protein_grams,
            workout_minutes: record.workout_minutes,
            workout_type: record.workout_type.clone(),
            work_hours: record.work_hours,
            income: record.income,
            expenses: record.expenses,
            mood: record.mood,
            self_dev_minutes: record.self_dev_minutes,
            personal_life_score: record.personal_life_score,
            notes: record.notes.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<DailyMetricRecord> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).map_err(|err| {
            AppError::validation(format!("stored metric date {} is invalid: {err}", self.date))
        })?;

        Ok(DailyMetricRecord {
            date,
            sleep_hours: self.sleep_hours,
            water_ml: self.water_ml,
            calories: self.calories,
            protein_grams: self.protein_grams,
            workout_minutes: self.workout_minutes,
            workout_type: self.workout_type,
            work_hours: self.work_hours,
            income: self.income,
            expenses: self.expenses,
            mood: self.mood,
            self_dev_minutes: self.self_dev_minutes,
            personal_life_score: self.personal_life_score,
            notes: self.notes,
        })
    }
}

impl TryFrom<&Row<'_>> for DailyMetricRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            date: row.get("date")?,
            sleep_hours: row.get("sleep_hours")?,
            water_ml: row.get("water_ml")?,
            calories: row.get("calories")?,
            protein_grams: row.get("protein_grams")?,
            workout_minutes: row.get("workout_minutes")?,
            workout_type: row.get("workout_type")?,
            work_hours: row.get("work_hours")?,
            income: row.get("income")?,
            expenses: row.get("expenses")?,
            mood: row.get("mood")?,
            self_dev_minutes: row.get("self_dev_minutes")?,
            personal_life_score: row.get("personal_life_score")?,
            notes: row.get("notes")?,
        })
    }
}

pub struct MetricsRepository;

impl MetricsRepository {
    /// Inserts or replaces the record for `(user_id, date)`.
    pub fn upsert(
        conn: &Connection,
        user_id: &str,
        record: &DailyMetricRecord,
        synced_at: Option<&str>,
    ) -> AppResult<()> {
        let row = DailyMetricRow::from_record(record);

        conn.execute(
            r#"
                INSERT INTO daily_metrics (
                    user_id, date, sleep_hours, water_ml, calories, protein_grams,
                    workout_minutes, workout_type, work_hours, income, expenses, mood,
                    self_dev_minutes, personal_life_score, notes, synced_at
                ) VALUES (
                    :user_id, :date, :sleep_hours, :water_ml, :calories, :protein_grams,
                    :workout_minutes, :workout_type, :work_hours, :income, :expenses, :mood,
                    :self_dev_minutes, :personal_life_score, :notes, :synced_at
                )
                ON CONFLICT(user_id, date) DO UPDATE SET
                    sleep_hours = excluded.sleep_hours,
                    water_ml = excluded.water_ml,
                    calories = excluded.calories,
                    protein_grams = excluded.protein_grams,
                    workout_minutes = excluded.workout_minutes,
                    workout_type = excluded.workout_type,
                    work_hours = excluded.work_hours,
                    income = excluded.income,
                    expenses = excluded.expenses,
                    mood = excluded.mood,
                    self_dev_minutes = excluded.self_dev_minutes,
                    personal_life_score = excluded.personal_life_score,
                    notes = excluded.notes,
                    synced_at = excluded.synced_at,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {
                ":user_id": user_id,
                ":date": &row.date,
                ":sleep_hours": &row.sleep_hours,
                ":water_ml": &row.water_ml,
                ":calories": &row.calories,
                ":protein_grams": &row.protein_grams,
                ":workout_minutes": &row.workout_minutes,
                ":workout_type": &row.workout_type,
                ":work_hours": &row.work_hours,
                ":income": &row.income,
                ":expenses": &row.expenses,
                ":mood": &row.mood,
                ":self_dev_minutes": &row.self_dev_minutes,
                ":personal_life_score": &row.personal_life_score,
                ":notes": &row.notes,
                ":synced_at": &synced_at,
            },
        )?;

        Ok(())
    }

    pub fn find(
        conn: &Connection,
        user_id: &str,
        date: NaiveDate,
    ) -> AppResult<Option<DailyMetricRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE user_id = :user_id AND date = :date");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(
                named_params! {
                    ":user_id": user_id,
                    ":date": date.format(DATE_FORMAT).to_string(),
                },
                |row| DailyMetricRow::try_from(row),
            )
            .optional()?;

        row.map(DailyMetricRow::into_record).transpose()
    }

    /// Records inside the inclusive window, oldest first.
    pub fn list_window(
        conn: &Connection,
        user_id: &str,
        window: &DateWindow,
    ) -> AppResult<Vec<DailyMetricRecord>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE user_id = :user_id AND date >= :start AND date <= :end ORDER BY date ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                named_params! {
                    ":user_id": user_id,
                    ":start": window.start.format(DATE_FORMAT).to_string(),
                    ":end": window.end.format(DATE_FORMAT).to_string(),
                },
                |row| DailyMetricRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(DailyMetricRow::into_record).collect()
    }

    pub fn delete(conn: &Connection, user_id: &str, date: NaiveDate) -> AppResult<bool> {
        let affected = conn.execute(
            "DELETE FROM daily_metrics WHERE user_id = :user_id AND date = :date",
            named_params! {
                ":user_id": user_id,
                ":date": date.format(DATE_FORMAT).to_string(),
            },
        )?;
        Ok(affected > 0)
    }

    pub fn delete_window(
        conn: &Connection,
        user_id: &str,
        window: &DateWindow,
    ) -> AppResult<usize> {
        let affected = conn.execute(
            "DELETE FROM daily_metrics WHERE user_id = :user_id AND date >= :start AND date <= :end",
            named_params! {
                ":user_id": user_id,
                ":start": window.start.format(DATE_FORMAT).to_string(),
                ":end": window.end.format(DATE_FORMAT).to_string(),
            },
        )?;
        Ok(affected)
    }
}
