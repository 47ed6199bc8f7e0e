use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use lifeos_app_lib::models::life_score::StatusLevel;
use lifeos_app_lib::models::metrics::DailyMetricRecord;
use lifeos_app_lib::models::recommendation::Severity;
use lifeos_app_lib::models::sphere::{Sphere, SphereWeights};
use lifeos_app_lib::models::window::DateWindow;
use lifeos_app_lib::services::engine::{evaluate_rules, rule_catalog};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date")
}

fn week() -> DateWindow {
    DateWindow::new(start(), start() + Duration::days(6)).expect("valid window")
}

fn days(fill: impl Fn(&mut DailyMetricRecord)) -> Vec<DailyMetricRecord> {
    (0..7)
        .map(|offset| {
            let mut record = DailyMetricRecord::empty(start() + Duration::days(offset));
            fill(&mut record);
            record
        })
        .collect()
}

#[test]
fn sleep_and_water_deprivation_raise_critical_alerts() {
    let records = days(|record| {
        record.sleep_hours = Some(4.0);
        record.water_ml = Some(500.0);
        record.mood = Some(3.0);
    });

    let analysis = evaluate_rules(&records, &SphereWeights::default(), &week());
    let ids: Vec<&str> = analysis
        .recommendations
        .iter()
        .map(|rec| rec.rule_id.as_str())
        .collect();

    assert!(ids.contains(&"SLEEP_CRITICAL"));
    assert!(ids.contains(&"WATER_CRITICAL"));
    assert!(ids.contains(&"MOOD_LOW"));
    assert!(!ids.contains(&"SLEEP_WARNING"));

    let sleep = analysis
        .recommendations
        .iter()
        .find(|rec| rec.rule_id == "SLEEP_CRITICAL")
        .expect("sleep alert");
    assert_eq!(sleep.rule_name, "Critical sleep deprivation");
    assert_eq!(sleep.severity, Severity::Critical);
    assert!(sleep.message.contains("4.0"));

    assert!(analysis.life_score < 30.0);
    assert_eq!(analysis.count(Severity::Critical), 2);
    assert_eq!(
        analysis.sphere_statuses[&Sphere::Sleep].status,
        StatusLevel::Warning
    );
}

#[test]
fn healthy_habits_only_produce_info() {
    let records = days(|record| {
        record.sleep_hours = Some(8.0);
        record.water_ml = Some(2600.0);
        record.workout_minutes = Some(60.0);
        record.calories = Some(2200.0);
        record.work_hours = Some(8.0);
        record.income = Some(2000.0);
        record.expenses = Some(800.0);
        record.mood = Some(8.0);
        record.self_dev_minutes = Some(60.0);
        record.personal_life_score = Some(8.0);
    });

    let analysis = evaluate_rules(&records, &SphereWeights::default(), &week());
    assert!(analysis.life_score > 70.0);

    for sphere in [Sphere::Sleep, Sphere::Water, Sphere::Fitness] {
        let for_sphere: Vec<_> = analysis
            .recommendations
            .iter()
            .filter(|rec| rec.sphere == sphere)
            .collect();
        assert_eq!(for_sphere.len(), 1, "{sphere}");
        assert_eq!(for_sphere[0].severity, Severity::Info);
    }

    let ids: HashSet<&str> = analysis
        .recommendations
        .iter()
        .map(|rec| rec.rule_id.as_str())
        .collect();
    assert!(ids.contains("SLEEP_EXCELLENT"));
    assert!(ids.contains("WATER_EXCELLENT"));
    assert!(ids.contains("FITNESS_EXCELLENT"));
    assert_eq!(analysis.count(Severity::Critical), 0);
    assert_eq!(analysis.count(Severity::Warning), 0);
}

#[test]
fn empty_window_yields_no_recommendations() {
    let analysis = evaluate_rules(&[], &SphereWeights::default(), &week());
    assert!(analysis.recommendations.is_empty());
    assert_eq!(analysis.life_score, 0.0);
    assert_eq!(analysis.sphere_statuses.len(), 9);
    assert_eq!(
        analysis.sphere_statuses[&Sphere::Sleep].status,
        StatusLevel::Critical
    );
}

#[test]
fn results_are_sorted_by_severity() {
    let records = days(|record| {
        record.sleep_hours = Some(8.0);
        record.water_ml = Some(1500.0);
        record.work_hours = Some(11.0);
        record.income = Some(1000.0);
        record.expenses = Some(100.0);
    });

    let analysis = evaluate_rules(&records, &SphereWeights::default(), &week());
    let severities: Vec<Severity> = analysis
        .recommendations
        .iter()
        .map(|rec| rec.severity)
        .collect();
    let mut sorted = severities.clone();
    sorted.sort();
    assert_eq!(severities, sorted);
    assert_eq!(severities.first(), Some(&Severity::Critical));
    assert_eq!(severities.last(), Some(&Severity::Info));
}

#[test]
fn at_most_one_alert_per_sphere() {
    let records = days(|record| {
        record.sleep_hours = Some(3.0);
        record.water_ml = Some(200.0);
        record.workout_minutes = Some(0.0);
        record.work_hours = Some(13.0);
        record.income = Some(100.0);
        record.expenses = Some(500.0);
        record.mood = Some(2.0);
        record.personal_life_score = Some(2.0);
    });

    let analysis = evaluate_rules(&records, &SphereWeights::default(), &week());
    let mut seen = HashSet::new();
    for rec in analysis
        .recommendations
        .iter()
        .filter(|rec| rec.severity != Severity::Info)
    {
        assert!(seen.insert(rec.sphere), "duplicate alert for {}", rec.sphere);
    }
    assert!(seen.contains(&Sphere::Finance));
    assert!(seen.contains(&Sphere::Fitness));
}

#[test]
fn catalog_lists_each_rule_once() {
    let catalog = rule_catalog();
    let ids: HashSet<&str> = catalog.iter().map(|rule| rule.id.as_str()).collect();
    assert_eq!(ids.len(), catalog.len());
    assert!(ids.contains("SLEEP_CRITICAL"));
    assert!(ids.contains("FINANCE_NEGATIVE"));
}

fn alerts_for(records: &[DailyMetricRecord], sphere: Sphere) -> usize {
    evaluate_rules(records, &SphereWeights::default(), &week())
        .recommendations
        .iter()
        .filter(|rec| rec.sphere == sphere && rec.severity != Severity::Info)
        .count()
}

fn sweep(from: f64, to: f64, step: f64) -> Vec<f64> {
    let steps = ((to - from) / step).round() as usize;
    (0..=steps).map(|i| from + step * i as f64).collect()
}

#[test]
fn one_alert_per_sphere_across_value_sweeps() {
    let cases: [(Sphere, Vec<f64>, fn(&mut DailyMetricRecord, f64)); 7] = [
        (Sphere::Sleep, sweep(0.0, 12.0, 0.25), |r, v| r.sleep_hours = Some(v)),
        (Sphere::Water, sweep(0.0, 4000.0, 50.0), |r, v| r.water_ml = Some(v)),
        (Sphere::Work, sweep(0.0, 16.0, 0.25), |r, v| r.work_hours = Some(v)),
        (Sphere::Fitness, sweep(0.0, 40.0, 1.0), |r, v| r.workout_minutes = Some(v)),
        (Sphere::Mood, sweep(1.0, 10.0, 0.25), |r, v| r.mood = Some(v)),
        (Sphere::PersonalLife, sweep(1.0, 10.0, 0.25), |r, v| {
            r.personal_life_score = Some(v)
        }),
        (Sphere::Finance, sweep(0.0, 2000.0, 25.0), |r, v| {
            r.income = Some(v);
            r.expenses = Some(700.0);
        }),
    ];

    for (sphere, values, set) in cases {
        for value in values {
            let records = days(|record| set(record, value));
            let alerts = alerts_for(&records, sphere);
            assert!(alerts <= 1, "{sphere} at {value} raised {alerts} alerts");
        }
    }
}
