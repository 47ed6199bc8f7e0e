use tracing::debug;

use crate::models::correlation::{CorrelationReport, CorrelationResult, CorrelationStrength};
use crate::models::metrics::{tracked_in_window, DailyMetricRecord, MetricField};
use crate::models::window::DateWindow;
use crate::utils::math::round_to;

pub const MIN_TRACKED_DAYS: usize = 5;
pub const MIN_PAIRED_POINTS: usize = 3;
pub const NOT_ENOUGH_DATA_MESSAGE: &str = "Not enough data for correlation analysis";
pub const INSUFFICIENT_DATA: &str = "Insufficient data";

/// A fixed pair of metrics checked for co-movement.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationPair {
    pub label: &'static str,
    pub x: MetricField,
    pub y: MetricField,
    pub template: &'static str,
}

pub const CORRELATION_PAIRS: [CorrelationPair; 5] = [
    CorrelationPair {
        label: "Sleep ↔ Mood",
        x: MetricField::SleepHours,
        y: MetricField::Mood,
        template: "Sleep quality affects mood",
    },
    CorrelationPair {
        label: "Exercise ↔ Mood",
        x: MetricField::WorkoutMinutes,
        y: MetricField::Mood,
        template: "Physical activity lifts mood",
    },
    CorrelationPair {
        label: "Sleep ↔ Productivity",
        x: MetricField::SleepHours,
        y: MetricField::WorkHours,
        template: "Rest affects work output",
    },
    CorrelationPair {
        label: "Hydration ↔ Mood",
        x: MetricField::WaterMl,
        y: MetricField::Mood,
        template: "Hydration affects wellbeing",
    },
    CorrelationPair {
        label: "Learning ↔ Mood",
        x: MetricField::SelfDevMinutes,
        y: MetricField::Mood,
        template: "Personal growth affects satisfaction",
    },
];

/// Pearson correlation via the sum formula, clamped to `[-1, 1]` and rounded
/// to two decimals. Mismatched lengths use the common prefix. Returns 0 when
/// either series has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2, mut sum_y2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys.iter()).take(n) {
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
        sum_y2 += y * y;
    }

    let n = n as f64;
    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    let r = numerator / denominator;
    if !r.is_finite() {
        return 0.0;
    }
    round_to(r.clamp(-1.0, 1.0), 2)
}

/// Days on which both metrics were logged, in date order.
fn paired_series(records: &[&DailyMetricRecord], pair: &CorrelationPair) -> (Vec<f64>, Vec<f64>) {
    records
        .iter()
        .filter_map(|record| Some((record.value(pair.x)?, record.value(pair.y)?)))
        .unzip()
}

pub fn correlate_pair(records: &[&DailyMetricRecord], pair: &CorrelationPair) -> CorrelationResult {
    let (xs, ys) = paired_series(records, pair);

    if xs.len() < MIN_PAIRED_POINTS {
        return CorrelationResult {
            label: pair.label.to_string(),
            x_metric: pair.x,
            y_metric: pair.y,
            coefficient: 0.0,
            strength: CorrelationStrength::WeakOrNone,
            interpretation: INSUFFICIENT_DATA.to_string(),
            sample_size: xs.len(),
        };
    }

    let coefficient = pearson(&xs, &ys);
    let strength = CorrelationStrength::classify(coefficient);

    CorrelationResult {
        label: pair.label.to_string(),
        x_metric: pair.x,
        y_metric: pair.y,
        coefficient,
        strength,
        interpretation: format!("{}. {}.", strength.label(), pair.template),
        sample_size: xs.len(),
    }
}

/// Correlates every fixed pair over the tracked days of `window`.
///
/// Fewer than five tracked days short-circuits to an empty list with a message.
pub fn compute_correlations(
    records: &[DailyMetricRecord],
    window: &DateWindow,
) -> CorrelationReport {
    let tracked = tracked_in_window(records, window);

    if tracked.len() < MIN_TRACKED_DAYS {
        debug!(
            target: "app::engine::correlations",
            tracked_days = tracked.len(),
            "not enough tracked days for correlation analysis"
        );
        return CorrelationReport {
            correlations: Vec::new(),
            message: Some(NOT_ENOUGH_DATA_MESSAGE.to_string()),
        };
    }

    let correlations: Vec<CorrelationResult> = CORRELATION_PAIRS
        .iter()
        .map(|pair| correlate_pair(&tracked, pair))
        .collect();

    debug!(
        target: "app::engine::correlations",
        tracked_days = tracked.len(),
        significant = correlations.iter().filter(|c| c.is_significant()).count(),
        "correlations computed"
    );

    CorrelationReport {
        correlations,
        message: None,
    }
}
