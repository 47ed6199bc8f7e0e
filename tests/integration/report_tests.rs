use chrono::{Duration, NaiveDate, TimeZone, Utc};
use lifeos_app_lib::models::goal::{GoalSnapshot, GoalStatus};
use lifeos_app_lib::models::metrics::DailyMetricRecord;
use lifeos_app_lib::models::report::{ReportFormat, Trend};
use lifeos_app_lib::models::sphere::{Sphere, SphereWeights};
use lifeos_app_lib::models::task::{TaskCategory, TaskPriority, TaskSnapshot, TaskStatus};
use lifeos_app_lib::models::window::DateWindow;
use lifeos_app_lib::services::engine::{
    compute_life_score, evaluate_rules, generate_report, render_sphere_report,
};
use lifeos_app_lib::services::report_service::{generate_report_at, CSV_HEADER};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 3).expect("valid date")
}

fn window() -> DateWindow {
    DateWindow::new(start(), start() + Duration::days(9)).expect("valid window")
}

fn records() -> Vec<DailyMetricRecord> {
    (0..10)
        .map(|offset| {
            let mut record = DailyMetricRecord::empty(start() + Duration::days(offset));
            record.sleep_hours = Some(if offset < 5 { 6.0 } else { 8.0 });
            record.water_ml = Some(1800.0);
            record.workout_minutes = Some(if offset % 2 == 0 { 40.0 } else { 0.0 });
            record.mood = Some(if offset == 3 { 9.0 } else { 6.0 });
            record.income = Some(3000.0);
            record.expenses = Some(1200.0);
            if offset == 4 {
                record.notes = Some("long day, \"busy\" week".to_string());
                record.workout_type = Some("running".to_string());
            }
            record
        })
        .collect()
}

fn goals() -> Vec<GoalSnapshot> {
    vec![
        GoalSnapshot {
            id: "goal-1".into(),
            title: "Sleep 8 hours".into(),
            sphere: Some(Sphere::Sleep),
            status: GoalStatus::Active,
            progress: 45.0,
            current_value: Some(7.0),
            target_value: Some(8.0),
            unit: Some("h".into()),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 1),
        },
        GoalSnapshot {
            id: "goal-2".into(),
            title: "Save for a trip".into(),
            sphere: Some(Sphere::Finance),
            status: GoalStatus::Completed,
            progress: 100.0,
            current_value: None,
            target_value: None,
            unit: None,
            end_date: None,
        },
    ]
}

fn tasks() -> Vec<TaskSnapshot> {
    (0..12)
        .map(|index| TaskSnapshot {
            id: format!("task-{index}"),
            title: format!("Task number {index}"),
            category: TaskCategory::Work,
            priority: if index == 0 {
                TaskPriority::Critical
            } else {
                TaskPriority::Medium
            },
            status: if index < 11 {
                TaskStatus::Pending
            } else {
                TaskStatus::Completed
            },
            due_date: None,
        })
        .collect()
}

#[test]
fn report_figures_match_direct_engine_calls() {
    let records = records();
    let weights = SphereWeights::default();
    let generated = generate_report(
        &records,
        &weights,
        &goals(),
        &tasks(),
        &window(),
        ReportFormat::Json,
    )
    .expect("report");

    let report = &generated.report;
    assert_eq!(report.life_score, compute_life_score(&records, &weights, &window()));
    assert_eq!(report.analysis, evaluate_rules(&records, &weights, &window()));
    assert_eq!(report.summary.life_score, report.life_score.total);
    assert_eq!(report.summary.total_days, 10);
    assert_eq!(report.summary.active_goals, 1);
    assert_eq!(report.summary.completed_goals, 1);
    assert_eq!(report.summary.completed_tasks, 1);
    assert_eq!(report.summary.pending_tasks, 11);
    assert_eq!(
        report.summary.critical_count
            + report.summary.warning_count
            + report.summary.info_count,
        report.analysis.recommendations.len()
    );

    let sleep = &report.spheres[&Sphere::Sleep];
    assert_eq!(sleep.trend, Trend::Up);
    assert_eq!(sleep.average, 7.0);
    assert_eq!(sleep.goal_progress, Some(45.0));
    assert_eq!(sleep.best_day.map(|day| day.date), Some(start() + Duration::days(5)));
    assert_eq!(sleep.worst_day.map(|day| day.date), Some(start()));

    let mood = &report.spheres[&Sphere::Mood];
    assert_eq!(mood.best_day.map(|day| day.value), Some(9.0));

    let parsed: serde_json::Value =
        serde_json::from_str(&generated.content).expect("json content");
    assert_eq!(parsed["summary"]["totalDays"], 10);
}

#[test]
fn csv_lists_records_in_date_order() {
    let mut shuffled = records();
    shuffled.reverse();

    let generated = generate_report(
        &shuffled,
        &SphereWeights::default(),
        &[],
        &[],
        &window(),
        ReportFormat::Csv,
    )
    .expect("csv report");

    let lines: Vec<&str> = generated.content.lines().collect();
    assert_eq!(lines[0], CSV_HEADER.join(","));
    assert_eq!(lines.len(), 11);
    assert!(lines[1].starts_with("2025-02-03,6,1800,,,40,,"));
    assert!(lines[5].starts_with("2025-02-07,"));
    assert!(lines[5].contains(",running,"));
    assert!(lines[5].ends_with("\"long day, \"\"busy\"\" week\""));
}

#[test]
fn text_report_has_every_section() {
    let generated_at = Utc.with_ymd_and_hms(2025, 2, 13, 9, 30, 0).unwrap();
    let generated = generate_report_at(
        &records(),
        &SphereWeights::default(),
        &goals(),
        &tasks(),
        &window(),
        ReportFormat::Text,
        generated_at,
    )
    .expect("text report");

    let text = &generated.content;
    for heading in [
        "LIFE SPHERES",
        "RECOMMENDATIONS",
        "ACTIVE GOALS",
        "TASKS",
        "DAILY DETAIL",
        "END OF REPORT",
    ] {
        assert!(text.contains(heading), "missing {heading}");
    }
    assert!(text.contains("Period: 2025-02-03 to 2025-02-12"));
    assert!(text.contains("Generated: 2025-02-13T09:30:00+00:00"));
    assert!(text.contains("Sleep 8 hours"));
    assert!(!text.contains("Save for a trip"));
    assert!(text.contains("Task number 9"));
    assert!(!text.contains("Task number 10"));
    assert!(!text.contains("2025-02-05:\n"));
    assert!(text.contains("2025-02-06:\n"));
}

#[test]
fn all_formats_share_one_report_model() {
    let generated_at = Utc.with_ymd_and_hms(2025, 2, 13, 0, 0, 0).unwrap();
    let models: Vec<_> = [ReportFormat::Json, ReportFormat::Csv, ReportFormat::Text]
        .into_iter()
        .map(|format| {
            generate_report_at(
                &records(),
                &SphereWeights::default(),
                &goals(),
                &tasks(),
                &window(),
                format,
                generated_at,
            )
            .expect("report")
            .report
        })
        .collect();

    assert_eq!(models[0], models[1]);
    assert_eq!(models[1], models[2]);
}

#[test]
fn empty_window_report_is_well_formed() {
    let generated = generate_report(
        &[],
        &SphereWeights::default(),
        &[],
        &[],
        &window(),
        ReportFormat::Text,
    )
    .expect("empty report");

    assert_eq!(generated.report.summary.total_days, 0);
    assert_eq!(generated.report.life_score.total, 0.0);
    assert!(generated.content.contains("No recommendations"));
    assert!(generated.content.contains("No active goals"));
}

#[test]
fn sphere_report_shows_statistics_or_notice() {
    let text = render_sphere_report(Sphere::Sleep, &records(), &window());
    assert!(text.contains("SPHERE REPORT"));
    assert!(text.contains("Entries: 10"));
    assert!(text.contains("Average: 7.0"));
    assert!(text.contains("Maximum: 8.0"));

    let empty = render_sphere_report(Sphere::SelfDevelopment, &records(), &window());
    assert!(empty.contains("No data for this sphere"));
}
