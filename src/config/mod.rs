pub mod app_config;
pub mod database;

pub use app_config::{AppConfig, ConfigError};
pub use database::DatabaseHandle;
