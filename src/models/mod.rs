pub mod analytics;
pub mod correlation;
pub mod goal;
pub mod life_score;
pub mod metrics;
pub mod recommendation;
pub mod report;
pub mod settings;
pub mod sphere;
pub mod task;
pub mod window;
