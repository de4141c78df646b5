pub mod browser;
pub mod classifier;
pub mod config;
pub mod extractors;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod providers;
pub mod reconciler;
pub mod run_logger;
pub mod runner;
pub mod scheduler;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
