//! Kiosk analytics session: heatmap tracking, event logging and a heartbeat
//! that keeps the session marked as alive while the process runs.

use crate::errors::AppError;
use crate::models::{ClickPoint, EventRecord, EventType, PageView, SessionRecord};
use crate::storage::Store;
use chrono::{Local, Utc};
use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct LoggerOptions {
    pub heartbeat: Duration,
    /// Fraction of movement events that are kept.
    pub move_sample_rate: f64,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_secs(30),
            move_sample_rate: 0.01,
        }
    }
}

struct Heartbeat {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct AnalyticsLogger {
    store: Store,
    session_id: String,
    options: LoggerOptions,
    heartbeat: Mutex<Option<Heartbeat>>,
}

impl AnalyticsLogger {
    pub fn new(store: Store, options: LoggerOptions) -> Self {
        Self {
            store,
            session_id: generate_session_id(),
            options,
            heartbeat: Mutex::new(None),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_running(&self) -> bool {
        self.heartbeat_slot().is_some()
    }

    // A panic while the slot was held cannot leave it half-written, so the
    // guard is recovered instead of losing track of the heartbeat.
    fn heartbeat_slot(&self) -> MutexGuard<'_, Option<Heartbeat>> {
        self.heartbeat.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the session active and spawns the heartbeat. Calling it while
    /// already running is a no-op. Must be called from within a tokio runtime.
    pub async fn start(&self) -> Result<(), AppError> {
        if self.is_running() {
            return Ok(());
        }

        let now = now_ms();
        let id = self.session_id.clone();
        self.store
            .update(|data| {
                data.sessions.insert(
                    id,
                    SessionRecord {
                        start_time: now,
                        last_seen: now,
                        end_time: None,
                        duration: None,
                        active: true,
                    },
                );
            })
            .await?;

        let (shutdown, mut stop_rx) = watch::channel(false);
        let store = self.store.clone();
        let session_id = self.session_id.clone();
        let period = self.options.heartbeat;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let seen = now_ms();
                        let result = store
                            .update(|data| {
                                if let Some(session) = data.sessions.get_mut(&session_id) {
                                    session.last_seen = seen;
                                    session.active = true;
                                }
                            })
                            .await;
                        match result {
                            Ok(()) => debug!(session = %session_id, "heartbeat"),
                            Err(err) => warn!(session = %session_id, "heartbeat failed: {}", err.message),
                        }
                    }
                    _ = stop_rx.changed() => break,
                }
            }
        });

        *self.heartbeat_slot() = Some(Heartbeat { shutdown, handle });
        info!(session = %self.session_id, every = ?period, "analytics session started");
        Ok(())
    }

    /// Cancels the heartbeat, closes the session and rolls it into the
    /// day's historical totals. A second call does nothing.
    pub async fn stop(&self) -> Result<(), AppError> {
        let heartbeat = self.heartbeat_slot().take();
        let Some(heartbeat) = heartbeat else {
            return Ok(());
        };

        let _ = heartbeat.shutdown.send(true);
        if let Err(err) = heartbeat.handle.await {
            warn!("heartbeat task ended abnormally: {err}");
        }

        let now = now_ms();
        let today = today_key();
        let id = self.session_id.clone();
        self.store
            .update(|data| {
                if let Some(session) = data.sessions.get_mut(&id) {
                    session.end_time = Some(now);
                    session.duration = Some(now - session.start_time);
                    session.active = false;
                }
                let totals = data.historical.entry(today).or_default();
                totals.total_sessions += 1;
                totals.last_updated = now;
            })
            .await?;

        info!(session = %self.session_id, "analytics session ended");
        Ok(())
    }

    pub async fn track_heatmap(
        &self,
        x: f64,
        y: f64,
        event_type: EventType,
        page: Option<String>,
    ) -> Result<ClickPoint, AppError> {
        self.record_point(x, y, event_type, page, None).await
    }

    /// Stores the point, the click total and the optional event in one
    /// update, so they are persisted and published together or not at all.
    async fn record_point(
        &self,
        x: f64,
        y: f64,
        event_type: EventType,
        page: Option<String>,
        event: Option<(&str, serde_json::Value)>,
    ) -> Result<ClickPoint, AppError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(AppError::bad_request("coordinates must be finite numbers"));
        }

        let point = ClickPoint {
            x: x.round(),
            y: y.round(),
            timestamp: now_ms(),
            session_id: self.session_id.clone(),
            event_type,
            page,
        };
        let today = today_key();
        let stored = point.clone();
        let record = event.map(|(name, data)| EventRecord {
            name: name.to_string(),
            data,
            timestamp: point.timestamp,
            session_id: self.session_id.clone(),
        });
        self.store
            .update(|data| {
                data.heatmap.entry(today.clone()).or_default().push(stored);
                if event_type == EventType::Click {
                    let totals = data.historical.entry(today).or_default();
                    totals.total_clicks += 1;
                    totals.last_updated = point.timestamp;
                }
                data.events.extend(record);
            })
            .await?;
        Ok(point)
    }

    pub async fn track_click(
        &self,
        x: f64,
        y: f64,
        target: Option<String>,
        page: Option<String>,
    ) -> Result<ClickPoint, AppError> {
        let target = target.unwrap_or_else(|| "unknown".to_string());
        let event = ("click", serde_json::json!({ "target": target }));
        self.record_point(x, y, EventType::Click, page, Some(event)).await
    }

    /// Returns `None` when the movement was sampled out.
    pub async fn track_movement(
        &self,
        x: f64,
        y: f64,
        page: Option<String>,
    ) -> Result<Option<ClickPoint>, AppError> {
        if fastrand::f64() >= self.options.move_sample_rate {
            return Ok(None);
        }
        self.track_heatmap(x, y, EventType::Move, page).await.map(Some)
    }

    pub async fn log_event(&self, name: &str, data: serde_json::Value) -> Result<(), AppError> {
        let record = EventRecord {
            name: name.to_string(),
            data,
            timestamp: now_ms(),
            session_id: self.session_id.clone(),
        };
        self.store.update(|app| app.events.push(record)).await
    }

    pub async fn log_page_view(&self, page: &str, duration: u64) -> Result<(), AppError> {
        let view = PageView {
            page: page.to_string(),
            duration,
            timestamp: now_ms(),
            session_id: self.session_id.clone(),
        };
        self.store.update(|app| app.page_views.push(view)).await
    }

    pub async fn session(&self) -> Option<SessionRecord> {
        self.store
            .read(|data| data.sessions.get(&self.session_id).cloned())
            .await
    }
}

impl Drop for AnalyticsLogger {
    fn drop(&mut self) {
        let slot = self.heartbeat.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(heartbeat) = slot.take() {
            heartbeat.handle.abort();
        }
    }
}

fn generate_session_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let suffix: String = (0..9)
        .map(|_| ALPHABET[fastrand::usize(..ALPHABET.len())] as char)
        .collect();
    format!("session_{}_{suffix}", now_ms())
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn today_key() -> String {
    Local::now().date_naive().to_string()
}
