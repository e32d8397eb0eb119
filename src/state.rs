use crate::analytics::AnalyticsLogger;
use crate::config::HeatmapConfig;
use crate::storage::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub logger: Arc<AnalyticsLogger>,
    pub heatmap: HeatmapConfig,
}

impl AppState {
    pub fn new(store: Store, logger: Arc<AnalyticsLogger>, heatmap: HeatmapConfig) -> Self {
        Self {
            store,
            logger,
            heatmap,
        }
    }
}
