use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::AppResult;
use crate::models::goal::{progress_bar, GoalSnapshot, GoalStatus};
use crate::models::metrics::{tracked_in_window, DailyMetricRecord, MetricField};
use crate::models::recommendation::Severity;
use crate::models::report::{
    DayValue, GeneratedReport, LifeReport, ReportFormat, ReportSummary, SphereReport, Trend,
};
use crate::models::sphere::{Sphere, SphereWeights};
use crate::models::task::{TaskSnapshot, TaskStatus};
use crate::models::window::DateWindow;
use crate::services::life_score_service::compute_life_score;
use crate::services::rule_engine::evaluate_rules;
use crate::utils::math::mean;

pub const CSV_HEADER: [&str; 14] = [
    "date",
    "sleep_hours",
    "water_ml",
    "calories",
    "protein_grams",
    "workout_minutes",
    "workout_type",
    "work_hours",
    "income",
    "expenses",
    "mood",
    "self_dev_minutes",
    "personal_life_score",
    "notes",
];

const BANNER_WIDTH: usize = 60;
const SPHERE_BANNER_WIDTH: usize = 50;
const MAX_PENDING_TASKS: usize = 10;
const DETAIL_DAYS: usize = 7;
const SPHERE_CHART_DAYS: usize = 14;
const CHART_WIDTH: f64 = 20.0;

/// Builds the report model and renders it in `format`.
pub fn generate_report(
    records: &[DailyMetricRecord],
    weights: &SphereWeights,
    goals: &[GoalSnapshot],
    tasks: &[TaskSnapshot],
    window: &DateWindow,
    format: ReportFormat,
) -> AppResult<GeneratedReport> {
    generate_report_at(records, weights, goals, tasks, window, format, Utc::now())
}

pub fn generate_report_at(
    records: &[DailyMetricRecord],
    weights: &SphereWeights,
    goals: &[GoalSnapshot],
    tasks: &[TaskSnapshot],
    window: &DateWindow,
    format: ReportFormat,
    generated_at: DateTime<Utc>,
) -> AppResult<GeneratedReport> {
    let report = build_report(records, weights, goals, tasks, window, generated_at);
    let content = render(&report, format)?;

    debug!(
        target: "app::engine::reports",
        format = format.as_str(),
        days = report.summary.total_days,
        bytes = content.len(),
        "report rendered"
    );

    Ok(GeneratedReport {
        format,
        content,
        report,
    })
}

/// Computes every figure once. All renderers read from the returned model.
pub fn build_report(
    records: &[DailyMetricRecord],
    weights: &SphereWeights,
    goals: &[GoalSnapshot],
    tasks: &[TaskSnapshot],
    window: &DateWindow,
    generated_at: DateTime<Utc>,
) -> LifeReport {
    let life_score = compute_life_score(records, weights, window);
    let analysis = evaluate_rules(records, weights, window);
    let tracked = tracked_in_window(records, window);

    let spheres = Sphere::ALL
        .iter()
        .map(|sphere| (*sphere, sphere_report(*sphere, &tracked, goals)))
        .collect::<BTreeMap<_, _>>();

    let summary = ReportSummary {
        life_score: life_score.total,
        total_days: tracked.len(),
        active_goals: goals.iter().filter(|goal| goal.is_active()).count(),
        completed_goals: goals
            .iter()
            .filter(|goal| goal.status == GoalStatus::Completed)
            .count(),
        completed_tasks: tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Completed)
            .count(),
        pending_tasks: tasks.iter().filter(|task| task.is_open()).count(),
        critical_count: analysis.count(Severity::Critical),
        warning_count: analysis.count(Severity::Warning),
        info_count: analysis.count(Severity::Info),
    };

    LifeReport {
        generated_at: generated_at.to_rfc3339(),
        period: *window,
        summary,
        life_score,
        analysis,
        spheres,
        goals: goals.to_vec(),
        tasks: tasks.to_vec(),
        records: tracked.into_iter().cloned().collect(),
    }
}

pub fn render(report: &LifeReport, format: ReportFormat) -> AppResult<String> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        ReportFormat::Csv => Ok(render_csv(&report.records)),
        ReportFormat::Text => Ok(render_text(report)),
    }
}

fn positive_series(tracked: &[&DailyMetricRecord], field: MetricField) -> Vec<DayValue> {
    tracked
        .iter()
        .filter_map(|record| {
            record
                .value(field)
                .filter(|value| *value > 0.0)
                .map(|value| DayValue {
                    date: record.date,
                    value,
                })
        })
        .collect()
}

/// Compares the mean of the first half of `values` with the rest.
pub fn trend_of(values: &[f64]) -> Trend {
    if values.len() < 2 {
        return Trend::Stable;
    }
    let mid = values.len() / 2;
    let first = mean(&values[..mid]).unwrap_or(0.0);
    let second = mean(&values[mid..]).unwrap_or(0.0);

    if second > first * 1.1 {
        Trend::Up
    } else if second < first * 0.9 {
        Trend::Down
    } else {
        Trend::Stable
    }
}

fn sphere_report(
    sphere: Sphere,
    tracked: &[&DailyMetricRecord],
    goals: &[GoalSnapshot],
) -> SphereReport {
    let series = positive_series(tracked, sphere.field());
    let values: Vec<f64> = series.iter().map(|day| day.value).collect();

    let mut best: Option<DayValue> = None;
    let mut worst: Option<DayValue> = None;
    for day in &series {
        if best.map_or(true, |current| day.value > current.value) {
            best = Some(*day);
        }
        if worst.map_or(true, |current| day.value < current.value) {
            worst = Some(*day);
        }
    }

    let goal_progress = goals
        .iter()
        .find(|goal| goal.is_active() && goal.sphere == Some(sphere))
        .map(|goal| goal.progress);

    SphereReport {
        average: mean(&values).unwrap_or(0.0),
        trend: trend_of(&values),
        best_day: best,
        worst_day: worst,
        goal_progress,
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One row per record in date order, absent values as empty cells.
pub fn render_csv(records: &[DailyMetricRecord]) -> String {
    let mut content = String::new();
    content.push_str(&CSV_HEADER.join(","));
    content.push('\n');

    for record in records {
        let row = [
            record.date.to_string(),
            csv_number(record.sleep_hours),
            csv_number(record.water_ml),
            csv_number(record.calories),
            csv_number(record.protein_grams),
            csv_number(record.workout_minutes),
            csv_escape(record.workout_type.as_deref().unwrap_or_default()),
            csv_number(record.work_hours),
            csv_number(record.income),
            csv_number(record.expenses),
            csv_number(record.mood),
            csv_number(record.self_dev_minutes),
            csv_number(record.personal_life_score),
            csv_escape(record.notes.as_deref().unwrap_or_default()),
        ];
        content.push_str(&row.join(","));
        content.push('\n');
    }

    content
}

fn push_banner(content: &mut String, ch: char, width: usize, title: &str) {
    let line = ch.to_string().repeat(width);
    content.push_str(&line);
    content.push('\n');
    content.push_str(title);
    content.push('\n');
    content.push_str(&line);
    content.push_str("\n\n");
}

/// Plain-text narrative meant to be pasted into an external assistant.
pub fn render_text(report: &LifeReport) -> String {
    let mut content = String::new();

    push_banner(&mut content, '═', BANNER_WIDTH, "LIFE OS: FULL REPORT FOR AI ANALYSIS");
    content.push_str(&format!(
        "Period: {} to {}\n",
        report.period.start, report.period.end
    ));
    content.push_str(&format!("Generated: {}\n", report.generated_at));
    content.push_str(&format!("LifeScore: {}/100\n", report.life_score.total));
    content.push_str(&format!("Tracked days: {}\n\n", report.summary.total_days));

    push_banner(&mut content, '━', BANNER_WIDTH, "LIFE SPHERES");
    for (sphere, overview) in &report.spheres {
        content.push_str(&format!(
            "{}: {:.1} {} (trend: {} {})\n",
            sphere.label(),
            overview.average,
            sphere.unit(),
            overview.trend.arrow(),
            overview.trend.as_str()
        ));
    }
    content.push('\n');

    push_banner(&mut content, '━', BANNER_WIDTH, "RECOMMENDATIONS");
    if report.analysis.recommendations.is_empty() {
        content.push_str("No recommendations. Everything looks fine!\n\n");
    } else {
        for rec in &report.analysis.recommendations {
            content.push_str(&format!(
                "{} [{}] {}\n   {}\n   Tip: {}\n\n",
                rec.severity.icon(),
                rec.severity,
                rec.rule_name,
                rec.message,
                rec.suggestion
            ));
        }
    }

    push_banner(&mut content, '━', BANNER_WIDTH, "ACTIVE GOALS");
    let active: Vec<&GoalSnapshot> = report.goals.iter().filter(|g| g.is_active()).collect();
    if active.is_empty() {
        content.push_str("No active goals\n\n");
    } else {
        for goal in active {
            let sphere = goal.sphere.map(|s| s.label()).unwrap_or("General");
            content.push_str(&format!("• {}\n", goal.title));
            content.push_str(&format!(
                "  Sphere: {} | Progress: {:.1}% {}\n",
                sphere,
                goal.progress,
                progress_bar(goal.progress)
            ));
            if let (Some(current), Some(target)) = (goal.current_value, goal.target_value) {
                content.push_str(&format!(
                    "  Target: {}/{} {}\n",
                    current,
                    target,
                    goal.unit.as_deref().unwrap_or_default()
                ));
            }
            if let Some(end_date) = goal.end_date {
                content.push_str(&format!("  Deadline: {}\n", end_date));
            }
            content.push('\n');
        }
    }

    push_banner(&mut content, '━', BANNER_WIDTH, "TASKS");
    content.push_str(&format!(
        "Total: {} | Completed: {} | Pending: {}\n\n",
        report.tasks.len(),
        report.summary.completed_tasks,
        report.summary.pending_tasks
    ));
    let pending: Vec<&TaskSnapshot> = report.tasks.iter().filter(|t| t.is_open()).collect();
    if !pending.is_empty() {
        content.push_str("Open tasks:\n");
        for task in pending.into_iter().take(MAX_PENDING_TASKS) {
            let due = task
                .due_date
                .map(|date| format!(" (due: {date})"))
                .unwrap_or_default();
            content.push_str(&format!(
                "  {} [{}] {}{}\n",
                task.priority.icon(),
                task.category,
                task.title,
                due
            ));
        }
        content.push('\n');
    }

    push_banner(
        &mut content,
        '━',
        BANNER_WIDTH,
        "DAILY DETAIL (last 7 tracked days)",
    );
    let skip = report.records.len().saturating_sub(DETAIL_DAYS);
    for record in report.records.iter().skip(skip) {
        content.push_str(&format!("{}:\n", record.date));
        let lines = [
            (record.sleep_hours, "Sleep", "h"),
            (record.water_ml, "Water", "ml"),
            (record.calories, "Calories", "kcal"),
            (record.workout_minutes, "Exercise", "min"),
            (record.work_hours, "Work", "h"),
            (record.mood, "Mood", "/10"),
            (record.self_dev_minutes, "Self-development", "min"),
        ];
        for (value, label, unit) in lines {
            if let Some(value) = value.filter(|v| *v > 0.0) {
                content.push_str(&format!("   {label}: {value}{unit}\n"));
            }
        }
        content.push('\n');
    }

    push_banner(&mut content, '═', BANNER_WIDTH, "END OF REPORT");
    content.push_str(
        "Tip: paste this report into an AI assistant such as ChatGPT or Qwen for personalised advice.\n",
    );

    content
}

/// Statistics and a bar chart for one sphere's positive values.
pub fn render_sphere_report(
    sphere: Sphere,
    records: &[DailyMetricRecord],
    window: &DateWindow,
) -> String {
    let tracked = tracked_in_window(records, window);
    let series = positive_series(&tracked, sphere.field());
    let mut content = String::new();

    push_banner(
        &mut content,
        '═',
        SPHERE_BANNER_WIDTH,
        &format!("SPHERE REPORT: {}", sphere.label()),
    );

    if series.is_empty() {
        content.push_str("No data for this sphere in the selected period.\n\n");
        content.push_str("Start tracking this sphere to unlock analytics.\n");
        return content;
    }

    let values: Vec<f64> = series.iter().map(|day| day.value).collect();
    let total: f64 = values.iter().sum();
    let average = mean(&values).unwrap_or(0.0);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let unit = sphere.unit();

    content.push_str(&format!("Period: {} days\n", window.days()));
    content.push_str(&format!("Entries: {}\n\n", values.len()));
    content.push_str("STATISTICS:\n");
    content.push_str(&format!("   Average: {average:.1} {unit}\n"));
    content.push_str(&format!("   Minimum: {min:.1} {unit}\n"));
    content.push_str(&format!("   Maximum: {max:.1} {unit}\n"));
    content.push_str(&format!("   Total: {total:.1} {unit}\n\n"));

    content.push_str("DAILY TREND:\n\n");
    let skip = tracked.len().saturating_sub(SPHERE_CHART_DAYS);
    for record in tracked.iter().skip(skip) {
        if let Some(value) = record.value(sphere.field()) {
            let cells = if max > 0.0 {
                ((value / max) * CHART_WIDTH).round().clamp(0.0, CHART_WIDTH) as usize
            } else {
                0
            };
            content.push_str(&format!(
                "   {}: {} {value:.1}\n",
                record.date,
                "█".repeat(cells)
            ));
        }
    }
    content.push('\n');
    content.push_str(&"═".repeat(SPHERE_BANNER_WIDTH));
    content.push('\n');

    content
}
