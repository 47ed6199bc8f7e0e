use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate, Utc};
use httpmock::prelude::*;
use lifeos_app_lib::db::DbPool;
use lifeos_app_lib::error::AppError;
use lifeos_app_lib::models::analytics::DataSource;
use lifeos_app_lib::models::life_score::LifeScoreBreakdown;
use lifeos_app_lib::models::metrics::DailyMetricRecord;
use lifeos_app_lib::models::report::ReportFormat;
use lifeos_app_lib::models::settings::EngineSettings;
use lifeos_app_lib::models::sphere::{Sphere, SphereWeights};
use lifeos_app_lib::models::window::DateWindow;
use lifeos_app_lib::services::analytics_service::AnalyticsService;
use lifeos_app_lib::services::local_store::LocalMetricStore;
use lifeos_app_lib::services::metric_source::MetricSource;
use lifeos_app_lib::services::remote_source::testing::source_for;
use serde_json::json;
use sha2::{Digest, Sha256};
use tempfile::tempdir;

const USER: &str = "user-42";

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date")
}

fn window() -> DateWindow {
    DateWindow::new(start(), start() + Duration::days(9)).expect("valid window")
}

fn records() -> Vec<DailyMetricRecord> {
    (0..10)
        .map(|offset| DailyMetricRecord {
            sleep_hours: Some(5.5 + (offset % 4) as f64),
            water_ml: Some(1200.0 + offset as f64 * 150.0),
            calories: Some(2000.0),
            workout_minutes: Some(if offset % 3 == 0 { 45.0 } else { 0.0 }),
            work_hours: Some(7.0 + (offset % 5) as f64),
            income: Some(1500.0),
            expenses: Some(900.0 + offset as f64 * 10.0),
            mood: Some(4.0 + (offset % 4) as f64),
            self_dev_minutes: Some(20.0),
            personal_life_score: Some(7.0),
            notes: (offset == 2).then(|| "dinner with friends".to_string()),
            ..DailyMetricRecord::empty(start() + Duration::days(offset))
        })
        .collect()
}

fn custom_weights() -> SphereWeights {
    SphereWeights {
        sleep: 30.0,
        ..SphereWeights::default()
    }
}

async fn serve_metrics(server: &MockServer, metrics: serde_json::Value) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/metrics");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "success": true, "metrics": metrics }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/api/users/{USER}/weights"));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "success": true, "weights": null }));
        })
        .await;
}

async fn online_then_offline_score(
    metrics: serde_json::Value,
) -> (LifeScoreBreakdown, LifeScoreBreakdown) {
    let server = MockServer::start_async().await;
    serve_metrics(&server, metrics).await;

    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("lifeos.sqlite")).expect("db pool");
    let online = AnalyticsService::new(LocalMetricStore::new(pool.clone()), Some(remote(&server)))
        .expect("online service");
    let offline = AnalyticsService::new(LocalMetricStore::new(pool), None).expect("offline");

    let online_score = online.life_score(USER, &window()).await.expect("online score");
    assert_eq!(online_score.source, DataSource::Remote);
    let offline_score = offline.life_score(USER, &window()).await.expect("offline score");
    assert_eq!(offline_score.source, DataSource::LocalCache);
    (online_score.data, offline_score.data)
}

async fn serve_remote(server: &MockServer) {
    let metrics = serde_json::to_value(records()).expect("serialize records");
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/metrics");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "success": true, "metrics": metrics, "count": 10 }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/api/users/{USER}/weights"));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "success": true, "weights": custom_weights() }));
        })
        .await;
}

fn remote(server: &MockServer) -> Arc<dyn MetricSource> {
    Arc::new(source_for(&server.base_url(), StdDuration::from_secs(2)).expect("remote source"))
}

#[tokio::test]
async fn remote_and_cached_paths_agree() {
    let server = MockServer::start_async().await;
    serve_remote(&server).await;

    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("lifeos.sqlite")).expect("db pool");

    let online = AnalyticsService::new(LocalMetricStore::new(pool.clone()), Some(remote(&server)))
        .expect("online service");
    let offline =
        AnalyticsService::new(LocalMetricStore::new(pool.clone()), None).expect("offline service");

    let online_score = online.life_score(USER, &window()).await.expect("online score");
    assert_eq!(online_score.source, DataSource::Remote);

    let offline_score = offline.life_score(USER, &window()).await.expect("offline score");
    assert_eq!(offline_score.source, DataSource::LocalCache);
    assert_eq!(online_score.data, offline_score.data);
    assert_eq!(online_score.data.spheres[&Sphere::Sleep].weight, 30.0);

    let online_rules = online.evaluate_rules(USER, Some(window())).await.expect("rules");
    let offline_rules = offline.evaluate_rules(USER, Some(window())).await.expect("rules");
    assert_eq!(online_rules.data, offline_rules.data);
    assert!(!online_rules.data.recommendations.is_empty());

    let online_corr = online.correlations(USER, Some(window())).await.expect("correlations");
    let offline_corr = offline.correlations(USER, Some(window())).await.expect("correlations");
    assert_eq!(online_corr.data, offline_corr.data);
    assert_eq!(online_corr.data.correlations.len(), 5);

    let online_report = online
        .generate_report(USER, Some(window()), &[], &[], ReportFormat::Csv)
        .await
        .expect("report");
    let offline_report = offline
        .generate_report(USER, Some(window()), &[], &[], ReportFormat::Csv)
        .await
        .expect("report");
    assert_eq!(online_report.data.content, offline_report.data.content);
    assert_eq!(online_report.data.report.summary, offline_report.data.report.summary);
    assert_eq!(online_report.data.report.spheres, offline_report.data.report.spheres);
    assert_eq!(online_report.data.report.records, offline_report.data.report.records);
}

#[tokio::test]
async fn remote_outage_falls_back_to_cache() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/metrics");
            then.status(503);
        })
        .await;

    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("lifeos.sqlite")).expect("db pool");
    let store = LocalMetricStore::new(pool);
    for record in records() {
        store.upsert_metric(USER, &record).expect("seed cache");
    }

    let service = AnalyticsService::new(store, Some(remote(&server))).expect("service");
    let score = service.life_score(USER, &window()).await.expect("fallback score");

    assert_eq!(score.source, DataSource::LocalCache);
    assert!(score.data.total > 0.0);
    assert_eq!(score.data.spheres[&Sphere::Sleep].weight, 15.0);
}

#[tokio::test]
async fn unknown_user_is_not_masked_by_the_cache() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/metrics");
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({ "error": "User not found" }));
        })
        .await;

    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("lifeos.sqlite")).expect("db pool");
    let service =
        AnalyticsService::new(LocalMetricStore::new(pool), Some(remote(&server))).expect("service");

    let err = service
        .life_score(USER, &window())
        .await
        .expect_err("404 surfaces");
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn exported_report_checksum_matches_file() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("lifeos.sqlite")).expect("db pool");
    let store = LocalMetricStore::new(pool);
    for record in records() {
        store.upsert_metric(USER, &record).expect("seed cache");
    }

    let service = AnalyticsService::new(store, None)
        .expect("service")
        .with_reports_dir(dir.path().join("exports"))
        .expect("reports dir");

    let exported = service
        .export_report_file(USER, Some(window()), &[], &[], ReportFormat::Text)
        .await
        .expect("export");

    assert_eq!(exported.data_source, DataSource::LocalCache);
    assert!(exported.file_path.ends_with(".txt"));
    let bytes = std::fs::read(&exported.file_path).expect("report file");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    assert_eq!(exported.checksum, format!("{:x}", hasher.finalize()));
}

#[tokio::test]
async fn dashboard_summarizes_the_trailing_week() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("lifeos.sqlite")).expect("db pool");
    let store = LocalMetricStore::new(pool);
    for record in records() {
        store.upsert_metric(USER, &record).expect("seed cache");
    }

    let service = AnalyticsService::new(store, None).expect("service");
    let reference = start() + Duration::days(9);
    let dashboard = service
        .dashboard(USER, reference, &[], &[])
        .await
        .expect("dashboard");

    assert_eq!(dashboard.source, DataSource::LocalCache);
    assert_eq!(dashboard.data.reference_date, reference);
    assert!(dashboard.data.top_recommendations.len() <= 5);
    assert!(dashboard.data.today.total > 0.0);
    assert_eq!(dashboard.data.goals.active, 0);
    assert_eq!(dashboard.data.tasks.pending, 0);
}

#[tokio::test]
async fn unrated_zero_mood_is_cached_and_scored_alike() {
    let (online, offline) = online_then_offline_score(json!([
        { "date": "2025-04-01", "sleepHours": 8, "mood": 0, "personalLifeScore": 0 }
    ]))
    .await;

    assert_eq!(online, offline);
    assert_eq!(online.total, 15.0);
    assert_eq!(online.spheres[&Sphere::Mood].score, 0.0);
}

#[tokio::test]
async fn duplicate_remote_days_resolve_to_the_same_record() {
    let (online, offline) = online_then_offline_score(json!([
        { "date": "2025-04-01", "sleepHours": 4 },
        { "date": "2025-04-01T12:00:00Z", "sleepHours": 8 }
    ]))
    .await;

    assert_eq!(online, offline);
    assert_eq!(online.spheres[&Sphere::Sleep].score, 50.0);
    assert_eq!(online.total, 7.5);
}

#[tokio::test]
async fn correlations_default_to_the_configured_lookback() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("lifeos.sqlite")).expect("db pool");
    let store = LocalMetricStore::new(pool.clone());
    let today = Utc::now().date_naive();
    for offset in 0..6 {
        let record = DailyMetricRecord {
            sleep_hours: Some(6.0 + offset as f64 * 0.5),
            mood: Some(5.0 + offset as f64 * 0.5),
            ..DailyMetricRecord::empty(today - Duration::days(offset))
        };
        store.upsert_metric(USER, &record).expect("seed cache");
    }

    let wide = AnalyticsService::from_settings(pool.clone(), &EngineSettings::default())
        .expect("service");
    let report = wide.correlations(USER, None).await.expect("correlations");
    assert_eq!(report.data.correlations.len(), 5);

    let narrow = AnalyticsService::from_settings(
        pool,
        &EngineSettings {
            correlation_lookback_days: 3,
            ..EngineSettings::default()
        },
    )
    .expect("service");
    let report = narrow.correlations(USER, None).await.expect("correlations");
    assert!(report.data.correlations.is_empty());
    assert!(report.data.message.is_some());
}

#[tokio::test]
async fn sphere_progress_reads_the_cached_window() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("lifeos.sqlite")).expect("db pool");
    let store = LocalMetricStore::new(pool);
    for record in records() {
        store.upsert_metric(USER, &record).expect("seed cache");
    }
    let service = AnalyticsService::new(store, None).expect("service");

    let all = service
        .sphere_progress(USER, &window(), None)
        .await
        .expect("progress");
    assert_eq!(all.source, DataSource::LocalCache);
    assert_eq!(all.data.len(), 9);
    assert_eq!(all.data[&Sphere::Finance].len(), 10);
    assert_eq!(all.data[&Sphere::Finance][0].value, 1500.0);

    let sleep = service
        .sphere_progress(USER, &window(), Some(Sphere::Sleep))
        .await
        .expect("progress");
    assert_eq!(sleep.data.len(), 1);
    assert_eq!(sleep.data[&Sphere::Sleep][1].value, 6.5);
}
