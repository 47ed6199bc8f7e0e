pub mod metrics_repository;
pub mod settings_repository;
pub mod weights_repository;
