pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{AppError, AppResult};
pub use services::analytics_service::AnalyticsService;
pub use services::metric_source::MetricSource;
