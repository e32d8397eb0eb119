use crate::models::{
    AppData, DailyPoint, EventType, StatsResponse, WeeklyAveragePoint, WeeklyPoint,
};
use chrono::{Datelike, Duration, Local, NaiveDate};

pub fn build_stats(data: &AppData) -> StatsResponse {
    build_stats_at(Local::now().date_naive(), data)
}

pub fn build_stats_at(today: NaiveDate, data: &AppData) -> StatsResponse {
    const WEEK_COUNT: usize = 8;

    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset as i64);
        let (clicks, moves) = day_counts(data, date);
        let sessions = data
            .historical
            .get(&date_key(date))
            .map(|totals| totals.total_sessions)
            .unwrap_or_default();
        last_7_days.push(DailyPoint {
            date: date.to_string(),
            clicks,
            moves,
            sessions,
        });
    }

    let current_week_start = week_start(today);
    let mut weekly_totals = Vec::with_capacity(WEEK_COUNT);
    let mut weekly_averages = Vec::with_capacity(WEEK_COUNT);

    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start - Duration::weeks(offset as i64);
        let end = start + Duration::days(6);

        let mut click_sum = 0u64;
        let mut move_sum = 0u64;
        for day_offset in 0..7 {
            let (clicks, moves) = day_counts(data, start + Duration::days(day_offset));
            click_sum = click_sum.saturating_add(clicks);
            move_sum = move_sum.saturating_add(moves);
        }

        let days_counted = if today < start {
            0
        } else if today > end {
            7
        } else {
            (today - start).num_days() as u8 + 1
        };

        let denom = if days_counted == 0 { 1.0 } else { f64::from(days_counted) };

        weekly_totals.push(WeeklyPoint {
            week: week_label(start),
            start_date: start.to_string(),
            end_date: end.to_string(),
            clicks: click_sum,
            moves: move_sum,
        });

        weekly_averages.push(WeeklyAveragePoint {
            week: week_label(start),
            days_counted,
            avg_clicks: click_sum as f64 / denom,
            avg_moves: move_sum as f64 / denom,
        });
    }

    StatsResponse {
        last_7_days,
        weekly_totals,
        weekly_averages,
        active_sessions: data.sessions.values().filter(|s| s.active).count(),
        total_sessions: data.historical.values().map(|t| t.total_sessions).sum(),
    }
}

fn day_counts(data: &AppData, date: NaiveDate) -> (u64, u64) {
    let Some(points) = data.heatmap.get(&date_key(date)) else {
        return (0, 0);
    };
    points.iter().fold((0, 0), |(clicks, moves), point| match point.event_type {
        EventType::Click => (clicks + 1, moves),
        EventType::Move => (clicks, moves + 1),
    })
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClickPoint, HistoricalTotals, SessionRecord};

    fn moved(x: f64) -> ClickPoint {
        ClickPoint {
            event_type: EventType::Move,
            ..ClickPoint::at(x, 0.0)
        }
    }

    #[test]
    fn stats_last_7_days_splits_clicks_and_moves() {
        let mut data = AppData::default();
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let two_days_ago = today - Duration::days(2);
        data.heatmap.insert(
            two_days_ago.to_string(),
            vec![ClickPoint::at(1.0, 1.0), ClickPoint::at(2.0, 2.0), moved(3.0)],
        );
        data.historical.insert(
            two_days_ago.to_string(),
            HistoricalTotals {
                total_sessions: 4,
                total_clicks: 2,
                last_updated: 0,
            },
        );

        let stats = build_stats_at(today, &data);
        assert_eq!(stats.last_7_days.len(), 7);
        let point = stats
            .last_7_days
            .iter()
            .find(|day| day.date == two_days_ago.to_string())
            .expect("missing day");
        assert_eq!(point.clicks, 2);
        assert_eq!(point.moves, 1);
        assert_eq!(point.sessions, 4);
        assert_eq!(stats.total_sessions, 4);
    }

    #[test]
    fn stats_weekly_series_lengths() {
        let data = AppData::default();
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let stats = build_stats_at(today, &data);
        assert_eq!(stats.weekly_totals.len(), 8);
        assert_eq!(stats.weekly_averages.len(), 8);
        assert_eq!(stats.last_7_days.len(), 7);
    }

    #[test]
    fn stats_current_week_average_uses_elapsed_days() {
        let mut data = AppData::default();
        // 2026-01-07 is a Wednesday, so three days of the week have elapsed.
        let today = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        data.heatmap.insert(
            today.to_string(),
            vec![ClickPoint::at(0.0, 0.0); 6],
        );
        data.sessions.insert(
            "session_1".to_string(),
            SessionRecord {
                start_time: 0,
                last_seen: 0,
                end_time: None,
                duration: None,
                active: true,
            },
        );

        let stats = build_stats_at(today, &data);
        let current = stats.weekly_averages.last().unwrap();
        assert_eq!(current.days_counted, 3);
        assert!((current.avg_clicks - 2.0).abs() < 1e-9);
        assert_eq!(stats.weekly_totals.last().unwrap().clicks, 6);
        assert_eq!(stats.active_sessions, 1);
    }
}
