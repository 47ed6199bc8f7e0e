use chrono::{Duration, NaiveDate};
use lifeos_app_lib::models::metrics::DailyMetricRecord;
use lifeos_app_lib::models::sphere::{Sphere, SphereWeights};
use lifeos_app_lib::models::window::{DateWindow, WindowPreset};
use lifeos_app_lib::services::engine::{compute_life_score, compute_life_wheel, life_score_trend};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date")
}

fn week() -> DateWindow {
    DateWindow::trailing(start() + Duration::days(6), 7)
}

fn struggling_week() -> Vec<DailyMetricRecord> {
    (0..7)
        .map(|offset| {
            let mut record = DailyMetricRecord::empty(start() + Duration::days(offset));
            record.sleep_hours = Some(4.0);
            record.water_ml = Some(500.0);
            record.mood = Some(3.0);
            record
        })
        .collect()
}

fn healthy_week() -> Vec<DailyMetricRecord> {
    (0..7)
        .map(|offset| DailyMetricRecord {
            sleep_hours: Some(8.0),
            water_ml: Some(2600.0),
            calories: Some(2200.0),
            workout_minutes: Some(60.0),
            work_hours: Some(8.0),
            income: Some(2000.0),
            expenses: Some(800.0),
            mood: Some(8.0),
            self_dev_minutes: Some(60.0),
            personal_life_score: Some(8.0),
            ..DailyMetricRecord::empty(start() + Duration::days(offset))
        })
        .collect()
}

#[test]
fn struggling_week_scores_low() {
    let breakdown = compute_life_score(&struggling_week(), &SphereWeights::default(), &week());

    assert!(breakdown.total < 30.0, "total was {}", breakdown.total);
    assert!((breakdown.total - 11.7).abs() < 0.05);
    assert_eq!(breakdown.spheres[&Sphere::Sleep].score, 50.0);
    assert_eq!(breakdown.spheres[&Sphere::Water].score, 20.0);
    assert_eq!(breakdown.spheres[&Sphere::Mood].score, 22.2);
    assert_eq!(breakdown.spheres[&Sphere::Fitness].score, 0.0);
}

#[test]
fn healthy_week_scores_high() {
    let breakdown = compute_life_score(&healthy_week(), &SphereWeights::default(), &week());

    assert!(breakdown.total > 70.0, "total was {}", breakdown.total);
    assert!(breakdown.total <= 100.0);
    assert_eq!(breakdown.spheres[&Sphere::Sleep].score, 100.0);
    assert_eq!(breakdown.spheres[&Sphere::Work].score, 100.0);
}

#[test]
fn empty_window_scores_zero() {
    let breakdown = compute_life_score(&[], &SphereWeights::default(), &week());
    assert_eq!(breakdown.total, 0.0);
    assert!(breakdown.spheres.values().all(|sphere| sphere.score == 0.0));
}

#[test]
fn scaling_every_weight_keeps_total() {
    let records = healthy_week();
    let defaults = SphereWeights::default();
    let mut doubled = defaults;
    for sphere in Sphere::ALL {
        doubled.set(sphere, defaults.get(sphere) * 2.0);
    }

    let base = compute_life_score(&records, &defaults, &week());
    let scaled = compute_life_score(&records, &doubled, &week());
    assert_eq!(base.total, scaled.total);
}

#[test]
fn only_weighted_spheres_contribute() {
    let mut weights = SphereWeights {
        sleep: 0.0,
        water: 0.0,
        nutrition: 0.0,
        fitness: 0.0,
        work: 0.0,
        finance: 0.0,
        mood: 0.0,
        self_development: 0.0,
        personal_life: 0.0,
    };
    weights.set(Sphere::Sleep, 1.0);

    let breakdown = compute_life_score(&struggling_week(), &weights, &week());
    assert_eq!(breakdown.total, 50.0);
}

#[test]
fn records_dated_outside_the_window_are_ignored() {
    let mut records = healthy_week();
    let mut stray = DailyMetricRecord::empty(start() - Duration::days(30));
    stray.sleep_hours = Some(1.0);
    records.push(stray);

    let with_stray = compute_life_score(&records, &SphereWeights::default(), &week());
    let without = compute_life_score(&healthy_week(), &SphereWeights::default(), &week());
    assert_eq!(with_stray, without);
}

#[test]
fn trend_and_wheel_follow_the_window() {
    let records = struggling_week();
    let points = life_score_trend(&records, &SphereWeights::default(), &week());
    assert_eq!(points.len(), 7);
    assert!(points.windows(2).all(|pair| pair[0].date < pair[1].date));

    let wheel = compute_life_wheel(&records, &week());
    assert_eq!(wheel.spheres[&Sphere::Sleep].percentage, 40.0);
    assert_eq!(wheel.spheres[&Sphere::Fitness].percentage, 0.0);
}

#[test]
fn presets_resolve_to_inclusive_windows() {
    let reference = start() + Duration::days(6);
    assert_eq!(WindowPreset::Last7Days.resolve(reference), week());
    assert_eq!(WindowPreset::Today.resolve(reference).days(), 1);
}

#[test]
fn three_tracked_fields_cap_the_total() {
    let records: Vec<DailyMetricRecord> = (0..7)
        .map(|offset| DailyMetricRecord {
            sleep_hours: Some(8.0),
            water_ml: Some(2600.0),
            workout_minutes: Some(60.0),
            ..DailyMetricRecord::empty(start() + Duration::days(offset))
        })
        .collect();

    let breakdown = compute_life_score(&records, &SphereWeights::default(), &week());
    assert_eq!(breakdown.spheres[&Sphere::Sleep].score, 100.0);
    assert_eq!(breakdown.spheres[&Sphere::Water].score, 100.0);
    assert_eq!(breakdown.spheres[&Sphere::Fitness].score, 100.0);
    assert_eq!(breakdown.total, 40.0);
}

#[test]
fn record_order_does_not_change_the_score() {
    let records: Vec<DailyMetricRecord> = (0..7)
        .map(|offset| DailyMetricRecord {
            sleep_hours: Some(5.3 + offset as f64 * 0.7),
            water_ml: Some(900.0 + offset as f64 * 333.3),
            workout_minutes: Some((offset * 17 % 50) as f64),
            work_hours: Some(6.1 + (offset % 3) as f64 * 1.9),
            income: Some(1234.5 * (offset + 1) as f64),
            mood: Some(2.0 + offset as f64 * 1.1),
            ..DailyMetricRecord::empty(start() + Duration::days(offset))
        })
        .collect();
    let weights = SphereWeights {
        sleep: 13.0,
        mood: 7.5,
        ..SphereWeights::default()
    };
    let expected = compute_life_score(&records, &weights, &week());

    let mut reversed = records.clone();
    reversed.reverse();
    assert_eq!(compute_life_score(&reversed, &weights, &week()), expected);

    for shift in 1..records.len() {
        let mut rotated = records.clone();
        rotated.rotate_left(shift);
        assert_eq!(compute_life_score(&rotated, &weights, &week()), expected);
    }

    let (even, odd): (Vec<_>, Vec<_>) =
        records.iter().cloned().enumerate().partition(|(i, _)| i % 2 == 0);
    let interleaved: Vec<DailyMetricRecord> =
        odd.into_iter().chain(even).map(|(_, record)| record).collect();
    assert_eq!(compute_life_score(&interleaved, &weights, &week()), expected);
}
