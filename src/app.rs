use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/track", post(handlers::track))
        .route("/api/heatmap", get(handlers::get_heatmap))
        .route("/api/heatmap.svg", get(handlers::get_heatmap_svg))
        .route("/api/heatmap/watch", get(handlers::watch_heatmap))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/events", post(handlers::log_event))
        .route("/api/pageviews", post(handlers::log_page_view))
        .route("/api/session", get(handlers::get_session))
        .with_state(state)
}
