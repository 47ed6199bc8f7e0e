use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::metrics::MetricField;

/// The nine life spheres, declared in canonical evaluation order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Sphere {
    Sleep,
    Water,
    Nutrition,
    Fitness,
    Work,
    Finance,
    Mood,
    SelfDevelopment,
    PersonalLife,
}

impl Sphere {
    pub const ALL: [Sphere; 9] = [
        Sphere::Sleep,
        Sphere::Water,
        Sphere::Nutrition,
        Sphere::Fitness,
        Sphere::Work,
        Sphere::Finance,
        Sphere::Mood,
        Sphere::SelfDevelopment,
        Sphere::PersonalLife,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sphere::Sleep => "sleep",
            Sphere::Water => "water",
            Sphere::Nutrition => "nutrition",
            Sphere::Fitness => "fitness",
            Sphere::Work => "work",
            Sphere::Finance => "finance",
            Sphere::Mood => "mood",
            Sphere::SelfDevelopment => "selfDevelopment",
            Sphere::PersonalLife => "personalLife",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sphere::Sleep => "Sleep",
            Sphere::Water => "Water",
            Sphere::Nutrition => "Nutrition",
            Sphere::Fitness => "Fitness",
            Sphere::Work => "Work",
            Sphere::Finance => "Finance",
            Sphere::Mood => "Mood",
            Sphere::SelfDevelopment => "Self-development",
            Sphere::PersonalLife => "Personal life",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Sphere::Sleep | Sphere::Work => "h",
            Sphere::Water => "ml",
            Sphere::Nutrition => "kcal",
            Sphere::Fitness | Sphere::SelfDevelopment => "min",
            Sphere::Finance => "currency",
            Sphere::Mood | Sphere::PersonalLife => "/10",
        }
    }

    /// Daily record field that feeds this sphere. Finance is driven by income.
    pub fn field(&self) -> MetricField {
        match self {
            Sphere::Sleep => MetricField::SleepHours,
            Sphere::Water => MetricField::WaterMl,
            Sphere::Nutrition => MetricField::Calories,
            Sphere::Fitness => MetricField::WorkoutMinutes,
            Sphere::Work => MetricField::WorkHours,
            Sphere::Finance => MetricField::Income,
            Sphere::Mood => MetricField::Mood,
            Sphere::SelfDevelopment => MetricField::SelfDevMinutes,
            Sphere::PersonalLife => MetricField::PersonalLifeScore,
        }
    }

    pub fn config(&self) -> SphereConfig {
        match self {
            Sphere::Sleep => SphereConfig::monotonic(0.0, 10.0, 8.0),
            Sphere::Water => SphereConfig::monotonic(0.0, 5000.0, 2500.0),
            Sphere::Nutrition => SphereConfig::monotonic(0.0, 4000.0, 2200.0),
            Sphere::Fitness => SphereConfig::monotonic(0.0, 180.0, 45.0),
            Sphere::Work => SphereConfig::optimal(0.0, 14.0, 8.0),
            Sphere::Finance => SphereConfig::monotonic(0.0, 100_000.0, 50_000.0),
            Sphere::Mood => SphereConfig::monotonic(1.0, 10.0, 8.0),
            Sphere::SelfDevelopment => SphereConfig::monotonic(0.0, 180.0, 60.0),
            Sphere::PersonalLife => SphereConfig::monotonic(1.0, 10.0, 8.0),
        }
    }
}

impl fmt::Display for Sphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Sphere {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "sleep" => Ok(Sphere::Sleep),
            "water" => Ok(Sphere::Water),
            "nutrition" => Ok(Sphere::Nutrition),
            "fitness" => Ok(Sphere::Fitness),
            "work" => Ok(Sphere::Work),
            "finance" => Ok(Sphere::Finance),
            "mood" => Ok(Sphere::Mood),
            "selfDevelopment" | "self_development" => Ok(Sphere::SelfDevelopment),
            "personalLife" | "personal_life" => Ok(Sphere::PersonalLife),
            other => Err(format!("unsupported sphere: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMode {
    /// More is better up to the target.
    Monotonic,
    /// Best at the target, penalized symmetrically on either side.
    Optimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SphereConfig {
    pub min: f64,
    pub max: f64,
    pub target: f64,
    pub mode: NormalizationMode,
}

impl SphereConfig {
    pub const fn monotonic(min: f64, max: f64, target: f64) -> Self {
        Self {
            min,
            max,
            target,
            mode: NormalizationMode::Monotonic,
        }
    }

    pub const fn optimal(min: f64, max: f64, target: f64) -> Self {
        Self {
            min,
            max,
            target,
            mode: NormalizationMode::Optimal,
        }
    }
}

/// Relative importance of each sphere in the LifeScore.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SphereWeights {
    pub sleep: f64,
    pub water: f64,
    pub nutrition: f64,
    pub fitness: f64,
    pub work: f64,
    pub finance: f64,
    pub mood: f64,
    pub self_development: f64,
    pub personal_life: f64,
}

impl Default for SphereWeights {
    fn default() -> Self {
        Self {
            sleep: 15.0,
            water: 10.0,
            nutrition: 10.0,
            fitness: 15.0,
            work: 15.0,
            finance: 15.0,
            mood: 10.0,
            self_development: 5.0,
            personal_life: 5.0,
        }
    }
}

impl SphereWeights {
    pub fn get(&self, sphere: Sphere) -> f64 {
        match sphere {
            Sphere::Sleep => self.sleep,
            Sphere::Water => self.water,
            Sphere::Nutrition => self.nutrition,
            Sphere::Fitness => self.fitness,
            Sphere::Work => self.work,
            Sphere::Finance => self.finance,
            Sphere::Mood => self.mood,
            Sphere::SelfDevelopment => self.self_development,
            Sphere::PersonalLife => self.personal_life,
        }
    }

    pub fn set(&mut self, sphere: Sphere, weight: f64) {
        let slot = match sphere {
            Sphere::Sleep => &mut self.sleep,
            Sphere::Water => &mut self.water,
            Sphere::Nutrition => &mut self.nutrition,
            Sphere::Fitness => &mut self.fitness,
            Sphere::Work => &mut self.work,
            Sphere::Finance => &mut self.finance,
            Sphere::Mood => &mut self.mood,
            Sphere::SelfDevelopment => &mut self.self_development,
            Sphere::PersonalLife => &mut self.personal_life,
        };
        *slot = weight;
    }

    pub fn total(&self) -> f64 {
        Sphere::ALL.iter().map(|sphere| self.get(*sphere)).sum()
    }

    pub fn validate(&self) -> AppResult<()> {
        for sphere in Sphere::ALL {
            let weight = self.get(sphere);
            if !weight.is_finite() || weight < 0.0 {
                return Err(AppError::validation(format!(
                    "weight for {sphere} must be a non-negative number, got {weight}"
                )));
            }
        }
        Ok(())
    }
}
