//! Maps a sphere's window aggregate onto a 0-100 score.
//!
//! Each sphere resolves to exactly one [`Normalizer`] through
//! [`strategy_for`]; the aggregator never branches on sphere identity.

use crate::models::sphere::{NormalizationMode, Sphere, SphereConfig};
use crate::utils::math::{clamp_score, safe_ratio};

const FINANCE_TARGET: f64 = 50_000.0;
const RATING_FLOOR: f64 = 1.0;
const RATING_CEILING: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalizer {
    /// Scores against `{min, max, target}` using the config's mode.
    Range(SphereConfig),
    /// `value / target`, capped at 100.
    ProportionalToTarget { target: f64 },
    /// Linear over a rating scale such as 1-10.
    RatingScale { floor: f64, ceiling: f64 },
}

pub fn strategy_for(sphere: Sphere) -> Normalizer {
    match sphere {
        Sphere::Finance => Normalizer::ProportionalToTarget {
            target: FINANCE_TARGET,
        },
        Sphere::Mood | Sphere::PersonalLife => Normalizer::RatingScale {
            floor: RATING_FLOOR,
            ceiling: RATING_CEILING,
        },
        other => Normalizer::Range(other.config()),
    }
}

impl Normalizer {
    /// An absent aggregate (no tracked days) scores 0.
    pub fn score(&self, aggregate: Option<f64>) -> f64 {
        let Some(value) = aggregate.filter(|v| v.is_finite()) else {
            return 0.0;
        };

        let raw = match *self {
            Normalizer::Range(config) => match config.mode {
                NormalizationMode::Monotonic => {
                    safe_ratio(value - config.min, config.target - config.min) * 100.0
                }
                NormalizationMode::Optimal => {
                    let deviation = (value - config.target).abs();
                    let max_deviation =
                        (config.target - config.min).max(config.max - config.target);
                    if max_deviation <= 0.0 {
                        0.0
                    } else {
                        (1.0 - deviation / max_deviation) * 100.0
                    }
                }
            },
            Normalizer::ProportionalToTarget { target } => safe_ratio(value, target) * 100.0,
            Normalizer::RatingScale { floor, ceiling } => {
                safe_ratio(value - floor, ceiling - floor) * 100.0
            }
        };

        clamp_score(raw)
    }
}

pub fn normalize(sphere: Sphere, aggregate: Option<f64>) -> f64 {
    strategy_for(sphere).score(aggregate)
}
