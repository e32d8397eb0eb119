use crate::errors::AppError;
use crate::feed::{PointQuery, Range, Snapshot};
use crate::heatmap::Overlay;
use crate::models::{
    EventRequest, EventType, HeatmapQuery, HeatmapResponse, PageViewRequest, SessionResponse,
    StatsResponse, TrackRequest, TrackResponse,
};
use crate::state::AppState;
use crate::stats::build_stats;
use crate::ui::render_index;
use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse},
    Json,
};
use chrono::Local;
use std::time::Duration;
use tracing::debug;

const WATCH_TIMEOUT: Duration = Duration::from_secs(25);

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let date = Local::now().date_naive().to_string();
    let snapshot = state.store.feed().current(&PointQuery::new(Range::Today));
    let overlay = Overlay::build(&snapshot.points, &state.heatmap);
    Html(render_index(&date, snapshot.points.len(), &overlay))
}

pub async fn track(
    State(state): State<AppState>,
    Json(payload): Json<TrackRequest>,
) -> Result<Json<TrackResponse>, AppError> {
    let page = payload.page.filter(|p| !p.trim().is_empty());
    let point = match payload.event_type {
        EventType::Click => Some(
            state
                .logger
                .track_click(payload.x, payload.y, payload.target, page)
                .await?,
        ),
        EventType::Move => state.logger.track_movement(payload.x, payload.y, page).await?,
    };

    Ok(Json(TrackResponse {
        recorded: point.is_some(),
        point,
    }))
}

pub async fn get_heatmap(
    State(state): State<AppState>,
    Query(query): Query<HeatmapQuery>,
) -> Result<Json<HeatmapResponse>, AppError> {
    let (points, range) = resolve(&query)?;
    let snapshot = state.store.feed().current(&points);
    respond(&state, &query, range, snapshot).map(Json)
}

pub async fn get_heatmap_svg(
    State(state): State<AppState>,
    Query(query): Query<HeatmapQuery>,
) -> Result<impl IntoResponse, AppError> {
    let config = state.heatmap.with_overrides(&query)?;
    let (points, _) = resolve(&query)?;
    let snapshot = state.store.feed().current(&points);
    let svg = Overlay::build(&snapshot.points, &config).to_svg();
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

/// Long-poll: answers as soon as a snapshot newer than `since` exists, or with
/// the latest one once the wait times out.
pub async fn watch_heatmap(
    State(state): State<AppState>,
    Query(query): Query<HeatmapQuery>,
) -> Result<Json<HeatmapResponse>, AppError> {
    let (points, range) = resolve(&query)?;
    state.heatmap.with_overrides(&query)?;
    let since = query.since.unwrap_or(0);
    let mut subscription = state.store.feed().subscribe(points.clone());

    let wait = async {
        let mut latest = None;
        while let Some(snapshot) = subscription.next().await {
            let fresh = snapshot.version > since;
            latest = Some(snapshot);
            if fresh {
                break;
            }
        }
        latest
    };

    let snapshot = match tokio::time::timeout(WATCH_TIMEOUT, wait).await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) | Err(_) => {
            debug!(since, "watch timed out, returning current snapshot");
            state.store.feed().current(&points)
        }
    };

    respond(&state, &query, range, snapshot).map(Json)
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.store.read(build_stats).await)
}

pub async fn log_event(
    State(state): State<AppState>,
    Json(payload): Json<EventRequest>,
) -> Result<StatusCode, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("event name must not be empty"));
    }
    state.logger.log_event(name, payload.data).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn log_page_view(
    State(state): State<AppState>,
    Json(payload): Json<PageViewRequest>,
) -> Result<StatusCode, AppError> {
    let page = payload.page.trim();
    if page.is_empty() {
        return Err(AppError::bad_request("page must not be empty"));
    }
    state.logger.log_page_view(page, payload.duration).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(SessionResponse {
        session_id: state.logger.session_id().to_string(),
        record: state.logger.session().await,
    })
}

fn resolve(query: &HeatmapQuery) -> Result<(PointQuery, Range), AppError> {
    let range = Range::parse(query.range.as_deref())?;
    Ok((PointQuery::new(range).with_page(query.page.clone()), range))
}

fn respond(
    state: &AppState,
    query: &HeatmapQuery,
    range: Range,
    snapshot: Snapshot,
) -> Result<HeatmapResponse, AppError> {
    let config = state.heatmap.with_overrides(query)?;
    Ok(HeatmapResponse {
        version: snapshot.version,
        range: range.label(),
        point_count: snapshot.points.len(),
        overlay: Overlay::build(&snapshot.points, &config),
    })
}
