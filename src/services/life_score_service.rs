use std::collections::BTreeMap;

use tracing::debug;

use crate::models::life_score::{
    LifeScoreBreakdown, LifeScorePoint, LifeWheel, ProgressPoint, SphereScore, SphereStatus,
    StatusLevel, WheelSegment,
};
use crate::models::metrics::{present_values, tracked_in_window, DailyMetricRecord};
use crate::models::sphere::{Sphere, SphereWeights};
use crate::models::window::DateWindow;
use crate::services::normalizer::normalize;
use crate::utils::math::{clamp_score, mean, positive_mean, round_to, safe_ratio};

/// Weighted 0-100 LifeScore over the tracked days of `window`.
///
/// Records outside the window are ignored. A window with no tracked day
/// yields a zero breakdown that still reports each sphere's weight.
pub fn compute_life_score(
    records: &[DailyMetricRecord],
    weights: &SphereWeights,
    window: &DateWindow,
) -> LifeScoreBreakdown {
    let tracked = tracked_in_window(records, window);
    if tracked.is_empty() {
        debug!(
            target: "app::engine::life_score",
            start = %window.start,
            end = %window.end,
            "no tracked days in window; returning zero breakdown"
        );
        return empty_breakdown(weights);
    }

    let breakdown = score_tracked(&tracked, weights);
    debug!(
        target: "app::engine::life_score",
        start = %window.start,
        end = %window.end,
        days = tracked.len(),
        total = breakdown.total,
        "life score computed"
    );
    breakdown
}

fn score_tracked(tracked: &[&DailyMetricRecord], weights: &SphereWeights) -> LifeScoreBreakdown {
    let mut spheres = BTreeMap::new();
    let mut total_weighted = 0.0;
    let mut total_weight = 0.0;

    for sphere in Sphere::ALL {
        let weight = weights.get(sphere);
        let aggregate = mean(&present_values(tracked, sphere.field()));
        let score = normalize(sphere, aggregate);
        let weighted_score = score * weight / 100.0;

        spheres.insert(
            sphere,
            SphereScore {
                score: round_to(score, 1),
                weight,
                weighted_score: round_to(weighted_score, 1),
            },
        );

        total_weighted += weighted_score;
        total_weight += weight;
    }

    let total = if total_weight > 0.0 {
        clamp_score(total_weighted / total_weight * 100.0)
    } else {
        0.0
    };

    LifeScoreBreakdown {
        total: round_to(total, 1),
        spheres,
    }
}

fn empty_breakdown(weights: &SphereWeights) -> LifeScoreBreakdown {
    let spheres = Sphere::ALL
        .iter()
        .map(|sphere| {
            (
                *sphere,
                SphereScore {
                    score: 0.0,
                    weight: weights.get(*sphere),
                    weighted_score: 0.0,
                },
            )
        })
        .collect();

    LifeScoreBreakdown {
        total: 0.0,
        spheres,
    }
}

/// Value-versus-target status: `<40%` critical, `<70%` warning,
/// `<90%` good, otherwise excellent.
pub fn sphere_status(value: f64, target: f64) -> SphereStatus {
    let percentage = if target > 0.0 {
        safe_ratio(value, target) * 100.0
    } else {
        0.0
    };
    let status = StatusLevel::from_percentage(percentage);

    SphereStatus {
        value: round_to(value, 1),
        target,
        percentage: percentage.round(),
        status,
        color: status.color(),
    }
}

/// Display ceiling for each balance-wheel segment.
pub fn wheel_max(sphere: Sphere) -> f64 {
    match sphere {
        Sphere::Sleep => 10.0,
        Sphere::Water => 3000.0,
        Sphere::Nutrition => 3000.0,
        Sphere::Fitness => 120.0,
        Sphere::Work => 12.0,
        Sphere::Finance => 10_000.0,
        Sphere::Mood => 10.0,
        Sphere::SelfDevelopment => 120.0,
        Sphere::PersonalLife => 10.0,
    }
}

pub fn compute_life_wheel(records: &[DailyMetricRecord], window: &DateWindow) -> LifeWheel {
    let tracked = tracked_in_window(records, window);
    let mut spheres = BTreeMap::new();
    let mut percentages = Vec::with_capacity(Sphere::ALL.len());

    for sphere in Sphere::ALL {
        let max = wheel_max(sphere);
        let value = positive_mean(&present_values(&tracked, sphere.field())).unwrap_or(0.0);
        let percentage = clamp_score(safe_ratio(value, max) * 100.0);
        percentages.push(percentage);
        spheres.insert(
            sphere,
            WheelSegment {
                value: round_to(value, 1),
                max,
                percentage: percentage.round(),
            },
        );
    }

    LifeWheel {
        spheres,
        overall_score: mean(&percentages).map(|v| v.round()).unwrap_or(0.0),
    }
}

/// Single-day LifeScore for each tracked day of the window.
pub fn life_score_trend(
    records: &[DailyMetricRecord],
    weights: &SphereWeights,
    window: &DateWindow,
) -> Vec<LifeScorePoint> {
    tracked_in_window(records, window)
        .into_iter()
        .map(|record| LifeScorePoint {
            date: record.date,
            score: score_tracked(&[record], weights).total,
        })
        .collect()
}

/// Per-sphere daily series over the tracked days of `window`, for charting.
/// `sphere` narrows the result to a single sphere.
pub fn sphere_progress(
    records: &[DailyMetricRecord],
    window: &DateWindow,
    sphere: Option<Sphere>,
) -> BTreeMap<Sphere, Vec<ProgressPoint>> {
    let tracked = tracked_in_window(records, window);
    let spheres: Vec<Sphere> = match sphere {
        Some(sphere) => vec![sphere],
        None => Sphere::ALL.to_vec(),
    };

    spheres
        .into_iter()
        .map(|sphere| {
            let field = sphere.field();
            let series = tracked
                .iter()
                .map(|record| ProgressPoint {
                    date: record.date,
                    value: record.value(field).unwrap_or(0.0),
                })
                .collect();
            (sphere, series)
        })
        .collect()
}
