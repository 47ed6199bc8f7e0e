use chrono::{Duration, NaiveDate};
use lifeos_app_lib::models::correlation::CorrelationStrength;
use lifeos_app_lib::models::metrics::{DailyMetricRecord, MetricField};
use lifeos_app_lib::models::window::DateWindow;
use lifeos_app_lib::services::correlation_service::{
    INSUFFICIENT_DATA, NOT_ENOUGH_DATA_MESSAGE,
};
use lifeos_app_lib::services::engine::compute_correlations;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid date")
}

fn window(days: i64) -> DateWindow {
    DateWindow::new(start(), start() + Duration::days(days - 1)).expect("valid window")
}

fn record(offset: i64, fill: impl FnOnce(&mut DailyMetricRecord)) -> DailyMetricRecord {
    let mut record = DailyMetricRecord::empty(start() + Duration::days(offset));
    fill(&mut record);
    record
}

#[test]
fn fewer_than_five_tracked_days_short_circuits() {
    let records: Vec<_> = (0..4)
        .map(|offset| {
            record(offset, |r| {
                r.sleep_hours = Some(7.0 + offset as f64);
                r.mood = Some(5.0 + offset as f64);
            })
        })
        .collect();

    let report = compute_correlations(&records, &window(14));
    assert!(report.correlations.is_empty());
    assert_eq!(report.message.as_deref(), Some(NOT_ENOUGH_DATA_MESSAGE));
}

#[test]
fn empty_window_has_no_correlations() {
    let report = compute_correlations(&[], &window(7));
    assert!(report.correlations.is_empty());
}

#[test]
fn sleep_tracks_mood_strongly() {
    let sleep = [5.0, 6.0, 7.0, 8.0, 9.0, 6.5];
    let records: Vec<_> = sleep
        .iter()
        .enumerate()
        .map(|(offset, hours)| {
            record(offset as i64, |r| {
                r.sleep_hours = Some(*hours);
                r.mood = Some(hours - 1.0);
            })
        })
        .collect();

    let report = compute_correlations(&records, &window(7));
    assert!(report.message.is_none());
    assert_eq!(report.correlations.len(), 5);

    let sleep_mood = report
        .correlations
        .iter()
        .find(|c| c.x_metric == MetricField::SleepHours && c.y_metric == MetricField::Mood)
        .expect("sleep/mood pair");
    assert_eq!(sleep_mood.coefficient, 1.0);
    assert_eq!(sleep_mood.strength, CorrelationStrength::StrongPositive);
    assert_eq!(sleep_mood.sample_size, 6);
    assert!(sleep_mood.is_significant());
    assert_eq!(report.significant().len(), 1);
}

#[test]
fn pairs_without_enough_overlap_are_marked() {
    let records: Vec<_> = (0..6)
        .map(|offset| {
            record(offset, |r| {
                r.sleep_hours = Some(6.0 + (offset % 3) as f64);
                if offset < 2 {
                    r.workout_minutes = Some(30.0);
                    r.mood = Some(6.0);
                }
            })
        })
        .collect();

    let report = compute_correlations(&records, &window(7));
    let exercise_mood = report
        .correlations
        .iter()
        .find(|c| c.x_metric == MetricField::WorkoutMinutes)
        .expect("exercise/mood pair");
    assert_eq!(exercise_mood.coefficient, 0.0);
    assert_eq!(exercise_mood.interpretation, INSUFFICIENT_DATA);
    assert_eq!(exercise_mood.sample_size, 2);
}

#[test]
fn coefficients_stay_in_range() {
    let records: Vec<_> = (0..10)
        .map(|offset| {
            record(offset, |r| {
                r.sleep_hours = Some(4.0 + ((offset * 7) % 5) as f64);
                r.water_ml = Some(1000.0 + ((offset * 3) % 4) as f64 * 400.0);
                r.work_hours = Some(5.0 + (offset % 4) as f64);
                r.self_dev_minutes = Some(((offset * 11) % 6) as f64 * 10.0);
                r.mood = Some(1.0 + ((offset * 5) % 9) as f64);
            })
        })
        .collect();

    let report = compute_correlations(&records, &window(10));
    for correlation in &report.correlations {
        assert!((-1.0..=1.0).contains(&correlation.coefficient));
    }
}
