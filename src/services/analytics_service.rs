use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::analytics::{Dashboard, DataSource, GoalsOverview, Sourced, TasksOverview};
use crate::models::correlation::CorrelationReport;
use crate::models::goal::GoalSnapshot;
use crate::models::life_score::{LifeScoreBreakdown, LifeScorePoint, LifeWheel, ProgressPoint};
use crate::models::metrics::DailyMetricRecord;
use crate::models::recommendation::RuleAnalysis;
use crate::models::report::{GeneratedReport, ReportExportResult, ReportFormat};
use crate::models::settings::{EngineSettings, LookbackScope};
use crate::models::sphere::{Sphere, SphereWeights};
use crate::models::task::{TaskPriority, TaskSnapshot};
use crate::models::window::DateWindow;
use crate::services::correlation_service::compute_correlations;
use crate::services::life_score_service::{
    compute_life_score, compute_life_wheel, life_score_trend, sphere_progress,
};
use crate::services::local_store::LocalMetricStore;
use crate::services::metric_source::MetricSource;
use crate::services::remote_source::{parse_timezone, RemoteMetricSource, RemoteSourceConfig};
use crate::services::report_service::{generate_report, render_sphere_report};
use crate::services::rule_engine::evaluate_rules;
use crate::utils::math::round_to;

const REPORT_PREFIX: &str = "lifeos-report";
const DASHBOARD_DAYS: u32 = 7;
const DASHBOARD_TOP_RECOMMENDATIONS: usize = 5;

/// Records and weights for one user and window, as served by one source.
#[derive(Debug, Clone)]
pub struct LoadedWindow {
    pub window: DateWindow,
    pub records: Vec<DailyMetricRecord>,
    pub weights: SphereWeights,
}

/// Facade over the remote API and the local cache. Every operation loads
/// the window once and runs the pure engine on it.
pub struct AnalyticsService {
    remote: Option<Arc<dyn MetricSource>>,
    local: LocalMetricStore,
    reports_dir: PathBuf,
    settings: EngineSettings,
}

impl AnalyticsService {
    pub fn new(local: LocalMetricStore, remote: Option<Arc<dyn MetricSource>>) -> AppResult<Self> {
        let reports_dir = default_reports_dir(local.pool().path());
        std::fs::create_dir_all(&reports_dir)?;
        Ok(Self {
            remote,
            local,
            reports_dir,
            settings: EngineSettings::default(),
        })
    }

    /// Wires the remote adapter when a base URL is configured.
    pub fn from_settings(db: DbPool, settings: &EngineSettings) -> AppResult<Self> {
        let remote = match RemoteSourceConfig::from_settings(settings)? {
            Some(config) => {
                info!(
                    target: "app::analytics",
                    base_url = %config.base_url,
                    "remote metrics enabled"
                );
                Some(Arc::new(RemoteMetricSource::try_new(config)?) as Arc<dyn MetricSource>)
            }
            None => {
                info!(target: "app::analytics", "no remote configured; serving from local cache");
                None
            }
        };
        Ok(Self::new(LocalMetricStore::new(db), remote)?.with_settings(settings.clone()))
    }

    /// Lookback lengths and timezone used to resolve default windows. The
    /// API token is not retained.
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = EngineSettings {
            remote_api_token: None,
            ..settings
        };
        self
    }

    pub fn with_reports_dir<P: Into<PathBuf>>(mut self, dir: P) -> AppResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        self.reports_dir = dir;
        Ok(self)
    }

    pub fn local_store(&self) -> &LocalMetricStore {
        &self.local
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// The configured lookback for `scope`, ending on `reference`.
    pub fn default_window(&self, scope: LookbackScope, reference: NaiveDate) -> DateWindow {
        DateWindow::trailing(reference, self.settings.lookback_days(scope))
    }

    /// Current calendar day in the configured timezone.
    pub fn today(&self) -> AppResult<NaiveDate> {
        let timezone = parse_timezone(&self.settings.timezone)?;
        Ok(Utc::now().with_timezone(&timezone).date_naive())
    }

    fn resolve_window(
        &self,
        scope: LookbackScope,
        window: Option<DateWindow>,
    ) -> AppResult<DateWindow> {
        match window {
            Some(window) => Ok(window),
            None => Ok(self.default_window(scope, self.today()?)),
        }
    }

    /// Loads the window from the remote source, falling back to the cache.
    ///
    /// `NotFound` from the remote propagates. Any other remote failure is
    /// logged and served from the cache. Remote successes are written through.
    pub async fn load_window(
        &self,
        user_id: &str,
        window: &DateWindow,
    ) -> AppResult<Sourced<LoadedWindow>> {
        if let Some(remote) = self.remote.as_ref() {
            match Self::fetch_from(remote.as_ref(), user_id, window).await {
                Ok(loaded) => {
                    self.write_through(user_id, &loaded);
                    return Ok(Sourced::new(loaded, DataSource::Remote));
                }
                Err(err) if err.is_not_found() => return Err(err),
                Err(err) => {
                    warn!(
                        target: "app::analytics",
                        user_id,
                        error = %err,
                        "remote metrics unavailable; falling back to local cache"
                    );
                }
            }
        }

        let loaded = Self::fetch_from(&self.local, user_id, window).await?;
        Ok(Sourced::new(loaded, DataSource::LocalCache))
    }

    async fn fetch_from(
        source: &dyn MetricSource,
        user_id: &str,
        window: &DateWindow,
    ) -> AppResult<LoadedWindow> {
        let records = source.fetch_metrics(user_id, window).await?;
        let weights = source.fetch_weights(user_id).await?.unwrap_or_default();
        debug!(
            target: "app::analytics",
            source = source.kind().as_str(),
            records = records.len(),
            "window loaded"
        );
        Ok(LoadedWindow {
            window: *window,
            records,
            weights,
        })
    }

    fn write_through(&self, user_id: &str, loaded: &LoadedWindow) {
        if let Err(err) = self
            .local
            .replace_window(user_id, &loaded.window, &loaded.records)
        {
            warn!(target: "app::analytics", error = %err, "failed to cache remote metrics");
        }
        if let Err(err) = self.local.save_weights(user_id, &loaded.weights) {
            warn!(target: "app::analytics", error = %err, "failed to cache remote weights");
        }
    }

    pub async fn life_score(
        &self,
        user_id: &str,
        window: &DateWindow,
    ) -> AppResult<Sourced<LifeScoreBreakdown>> {
        let loaded = self.load_window(user_id, window).await?;
        Ok(loaded.map(|data| compute_life_score(&data.records, &data.weights, &data.window)))
    }

    /// `None` evaluates the configured rules lookback ending today.
    pub async fn evaluate_rules(
        &self,
        user_id: &str,
        window: Option<DateWindow>,
    ) -> AppResult<Sourced<RuleAnalysis>> {
        let window = self.resolve_window(LookbackScope::Rules, window)?;
        let loaded = self.load_window(user_id, &window).await?;
        Ok(loaded.map(|data| evaluate_rules(&data.records, &data.weights, &data.window)))
    }

    pub async fn correlations(
        &self,
        user_id: &str,
        window: Option<DateWindow>,
    ) -> AppResult<Sourced<CorrelationReport>> {
        let window = self.resolve_window(LookbackScope::Correlations, window)?;
        let loaded = self.load_window(user_id, &window).await?;
        Ok(loaded.map(|data| compute_correlations(&data.records, &data.window)))
    }

    pub async fn life_wheel(
        &self,
        user_id: &str,
        window: &DateWindow,
    ) -> AppResult<Sourced<LifeWheel>> {
        let loaded = self.load_window(user_id, window).await?;
        Ok(loaded.map(|data| compute_life_wheel(&data.records, &data.window)))
    }

    pub async fn life_score_trend(
        &self,
        user_id: &str,
        window: &DateWindow,
    ) -> AppResult<Sourced<Vec<LifeScorePoint>>> {
        let loaded = self.load_window(user_id, window).await?;
        Ok(loaded.map(|data| life_score_trend(&data.records, &data.weights, &data.window)))
    }

    pub async fn sphere_progress(
        &self,
        user_id: &str,
        window: &DateWindow,
        sphere: Option<Sphere>,
    ) -> AppResult<Sourced<BTreeMap<Sphere, Vec<ProgressPoint>>>> {
        let loaded = self.load_window(user_id, window).await?;
        Ok(loaded.map(|data| sphere_progress(&data.records, &data.window, sphere)))
    }

    pub async fn sphere_report(
        &self,
        user_id: &str,
        sphere: Sphere,
        window: &DateWindow,
    ) -> AppResult<Sourced<String>> {
        let loaded = self.load_window(user_id, window).await?;
        Ok(loaded.map(|data| render_sphere_report(sphere, &data.records, &data.window)))
    }

    /// `None` reports over the configured report lookback ending today.
    pub async fn generate_report(
        &self,
        user_id: &str,
        window: Option<DateWindow>,
        goals: &[GoalSnapshot],
        tasks: &[TaskSnapshot],
        format: ReportFormat,
    ) -> AppResult<Sourced<GeneratedReport>> {
        let window = self.resolve_window(LookbackScope::Report, window)?;
        let loaded = self.load_window(user_id, &window).await?;
        let source = loaded.source;
        let data = loaded.data;
        let report =
            generate_report(&data.records, &data.weights, goals, tasks, &data.window, format)?;
        Ok(Sourced::new(report, source))
    }

    /// Renders a report and writes it under the reports directory.
    pub async fn export_report_file(
        &self,
        user_id: &str,
        window: Option<DateWindow>,
        goals: &[GoalSnapshot],
        tasks: &[TaskSnapshot],
        format: ReportFormat,
    ) -> AppResult<ReportExportResult> {
        let generated = self
            .generate_report(user_id, window, goals, tasks, format)
            .await?;

        let timestamp = Utc::now().format("%Y%m%dT%H%M%SZ");
        let filename = format!("{REPORT_PREFIX}-{timestamp}.{}", format.file_extension());
        let path = self.reports_dir.join(filename);
        std::fs::write(&path, generated.data.content.as_bytes())?;

        let mut hasher = Sha256::new();
        hasher.update(generated.data.content.as_bytes());
        let checksum = format!("{:x}", hasher.finalize());

        info!(
            target: "app::analytics",
            path = %path.display(),
            format = format.as_str(),
            source = generated.source.as_str(),
            "report exported"
        );

        Ok(ReportExportResult {
            file_path: path.to_string_lossy().to_string(),
            format,
            generated_at: generated.data.report.generated_at.clone(),
            checksum,
            data_source: generated.source,
        })
    }

    /// Today's LifeScore plus the trailing week's analysis, wheel, and the
    /// supplied goals and tasks summarized.
    pub async fn dashboard(
        &self,
        user_id: &str,
        reference_date: NaiveDate,
        goals: &[GoalSnapshot],
        tasks: &[TaskSnapshot],
    ) -> AppResult<Sourced<Dashboard>> {
        let week = DateWindow::trailing(reference_date, DASHBOARD_DAYS);
        let loaded = self.load_window(user_id, &week).await?;

        Ok(loaded.map(|data| {
            let today = compute_life_score(
                &data.records,
                &data.weights,
                &DateWindow::single(reference_date),
            );
            let weekly = evaluate_rules(&data.records, &data.weights, &data.window);
            let top_recommendations = weekly
                .recommendations
                .iter()
                .take(DASHBOARD_TOP_RECOMMENDATIONS)
                .cloned()
                .collect();

            Dashboard {
                reference_date,
                today,
                weekly,
                top_recommendations,
                goals: goals_overview(goals),
                tasks: tasks_overview(tasks),
                wheel: compute_life_wheel(&data.records, &data.window),
                generated_at: Utc::now().to_rfc3339(),
            }
        }))
    }
}

fn goals_overview(goals: &[GoalSnapshot]) -> GoalsOverview {
    let active: Vec<&GoalSnapshot> = goals.iter().filter(|goal| goal.is_active()).collect();
    let average_progress = if active.is_empty() {
        0.0
    } else {
        active.iter().map(|goal| goal.progress).sum::<f64>() / active.len() as f64
    };
    GoalsOverview {
        active: active.len(),
        average_progress: round_to(average_progress, 1),
    }
}

fn tasks_overview(tasks: &[TaskSnapshot]) -> TasksOverview {
    let open = tasks.iter().filter(|task| task.is_open());
    let (pending, critical) = open.fold((0, 0), |(pending, critical), task| {
        let critical = critical + usize::from(task.priority == TaskPriority::Critical);
        (pending + 1, critical)
    });
    TasksOverview { pending, critical }
}

fn default_reports_dir(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .map(|dir| dir.join("reports"))
        .unwrap_or_else(|| std::env::temp_dir().join("lifeos"))
}
