pub mod analytics_service;
pub mod correlation_service;
pub mod life_score_service;
pub mod local_store;
pub mod metric_source;
pub mod normalizer;
pub mod remote_source;
pub mod report_service;
pub mod rule_engine;
pub mod settings_service;

/// Pure entry points over materialized record slices.
pub mod engine {
    pub use super::correlation_service::compute_correlations;
    pub use super::life_score_service::{
        compute_life_score, compute_life_wheel, life_score_trend, sphere_progress,
    };
    pub use super::report_service::{generate_report, render_sphere_report};
    pub use super::rule_engine::{evaluate_rules, rule_catalog};
}
