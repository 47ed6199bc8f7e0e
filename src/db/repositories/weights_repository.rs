use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;
use crate::models::sphere::SphereWeights;

#[derive(Debug, Clone)]
pub struct SphereWeightsRow {
    pub user_id: String,
    pub sleep: f64,
    pub water: f64,
    pub nutrition: f64,
    pub fitness: f64,
    pub work: f64,
    pub finance: f64,
    pub mood: f64,
    pub self_development: f64,
    pub personal_life: f64,
    pub updated_at: String,
}

impl SphereWeightsRow {
    pub fn into_weights(self) -> SphereWeights {
        SphereWeights {
            sleep: self.sleep,
            water: self.water,
            nutrition: self.nutrition,
            fitness: self.fitness,
            work: self.work,
            finance: self.finance,
            mood: self.mood,
            self_development: self.self_development,
            personal_life: self.personal_life,
        }
    }
}

impl TryFrom<&Row<'_>> for SphereWeightsRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.get("user_id")?,
            sleep: row.get("sleep")?,
            water: row.get("water")?,
            nutrition: row.get("nutrition")?,
            fitness: row.get("fitness")?,
            work: row.get("work")?,
            finance: row.get("finance")?,
            mood: row.get("mood")?,
            self_development: row.get("self_development")?,
            personal_life: row.get("personal_life")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct WeightsRepository;

impl WeightsRepository {
    pub fn get(conn: &Connection, user_id: &str) -> AppResult<Option<SphereWeightsRow>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT user_id, sleep, water, nutrition, fitness, work, finance, mood,
                       self_development, personal_life, updated_at
                FROM sphere_weights
                WHERE user_id = ?1
            "#,
        )?;

        let row = stmt
            .query_row([user_id], |row| SphereWeightsRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    pub fn upsert(conn: &Connection, user_id: &str, weights: &SphereWeights) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO sphere_weights (
                    user_id, sleep, water, nutrition, fitness, work, finance, mood,
                    self_development, personal_life
                ) VALUES (
                    :user_id, :sleep, :water, :nutrition, :fitness, :work, :finance, :mood,
                    :self_development, :personal_life
                )
                ON CONFLICT(user_id) DO UPDATE SET
                    sleep = excluded.sleep,
                    water = excluded.water,
                    nutrition = excluded.nutrition,
                    fitness = excluded.fitness,
                    work = excluded.work,
                    finance = excluded.finance,
                    mood = excluded.mood,
                    self_development = excluded.self_development,
                    personal_life = excluded.personal_life,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {
                ":user_id": user_id,
                ":sleep": weights.sleep,
                ":water": weights.water,
                ":nutrition": weights.nutrition,
                ":fitness": weights.fitness,
                ":work": weights.work,
                ":finance": weights.finance,
                ":mood": weights.mood,
                ":self_development": weights.self_development,
                ":personal_life": weights.personal_life,
            },
        )?;

        Ok(())
    }

    pub fn delete(conn: &Connection, user_id: &str) -> AppResult<bool> {
        let affected = conn.execute("DELETE FROM sphere_weights WHERE user_id = ?1", [user_id])?;
        Ok(affected > 0)
    }
}
