pub mod analytics;
pub mod app;
pub mod config;
pub mod errors;
pub mod feed;
pub mod handlers;
pub mod heatmap;
pub mod models;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod state;

pub use analytics::{AnalyticsLogger, LoggerOptions};
pub use app::router;
pub use config::{HeatmapConfig, ServerConfig};
pub use state::AppState;
pub use storage::{Store, load_data};
