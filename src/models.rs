use crate::heatmap::render::Overlay;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Click,
    Move,
}

/// A single recorded pointer interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickPoint {
    pub x: f64,
    pub y: f64,
    pub timestamp: i64,
    pub session_id: String,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

impl ClickPoint {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            timestamp: 0,
            session_id: String::new(),
            event_type: EventType::Click,
            page: None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub start_time: i64,
    pub last_seen: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub name: String,
    pub data: serde_json::Value,
    pub timestamp: i64,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub page: String,
    pub duration: u64,
    pub timestamp: i64,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalTotals {
    pub total_sessions: u64,
    pub total_clicks: u64,
    pub last_updated: i64,
}

/// Points are keyed by `YYYY-MM-DD` of the day they were recorded.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub heatmap: BTreeMap<String, Vec<ClickPoint>>,
    #[serde(default)]
    pub sessions: BTreeMap<String, SessionRecord>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub page_views: Vec<PageView>,
    #[serde(default)]
    pub historical: BTreeMap<String, HistoricalTotals>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub recorded: bool,
    pub point: Option<ClickPoint>,
}

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct PageViewRequest {
    pub page: String,
    pub duration: u64,
}

/// Query string accepted by the heatmap endpoints. Missing heatmap options
/// fall back to the server defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapQuery {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    pub cell_size: Option<u32>,
    pub threshold: Option<f64>,
    pub intensity: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub since: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapResponse {
    pub version: u64,
    pub range: String,
    pub point_count: usize,
    #[serde(flatten)]
    pub overlay: Overlay,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub record: Option<SessionRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: String,
    pub clicks: u64,
    pub moves: u64,
    pub sessions: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub clicks: u64,
    pub moves: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAveragePoint {
    pub week: String,
    pub days_counted: u8,
    pub avg_clicks: f64,
    pub avg_moves: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub last_7_days: Vec<DailyPoint>,
    pub weekly_totals: Vec<WeeklyPoint>,
    pub weekly_averages: Vec<WeeklyAveragePoint>,
    pub active_sessions: usize,
    pub total_sessions: u64,
}
