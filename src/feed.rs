//! Full-snapshot subscriptions over the recorded point tree.
//!
//! Every change republishes the whole tree; subscribers re-filter it with
//! their [`PointQuery`] and get the complete current point set, never a diff.

use crate::errors::AppError;
use crate::models::ClickPoint;
use chrono::{Duration, Local, NaiveDate};
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::watch;

pub type PointTree = BTreeMap<String, Vec<ClickPoint>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    Today,
    /// The seven days ending today.
    Week,
    All,
    Day(NaiveDate),
}

impl Range {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(str::trim) {
            None | Some("") | Some("today") => Ok(Self::Today),
            Some("week") => Ok(Self::Week),
            Some("all") => Ok(Self::All),
            Some(other) => NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .map(Self::Day)
                .map_err(|_| AppError::bad_request("range must be today, week, all or YYYY-MM-DD")),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Today => "today".to_string(),
            Self::Week => "week".to_string(),
            Self::All => "all".to_string(),
            Self::Day(date) => date.to_string(),
        }
    }

    fn contains(&self, key: &str, today: NaiveDate) -> bool {
        let Ok(date) = NaiveDate::parse_from_str(key, "%Y-%m-%d") else {
            return false;
        };
        match self {
            Self::Today => date == today,
            Self::Week => date <= today && date > today - Duration::days(7),
            Self::All => true,
            Self::Day(day) => date == *day,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointQuery {
    pub range: Range,
    pub page: Option<String>,
}

impl PointQuery {
    pub fn new(range: Range) -> Self {
        Self { range, page: None }
    }

    pub fn with_page(mut self, page: Option<String>) -> Self {
        self.page = page.filter(|p| !p.is_empty());
        self
    }

    pub fn select(&self, tree: &PointTree, today: NaiveDate) -> Vec<ClickPoint> {
        tree.iter()
            .filter(|(key, _)| self.range.contains(key, today))
            .flat_map(|(_, points)| points.iter())
            .filter(|point| match &self.page {
                Some(page) => point.page.as_deref() == Some(page.as_str()),
                None => true,
            })
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: u64,
    pub points: Vec<ClickPoint>,
}

#[derive(Debug, Clone, Default)]
struct Published {
    version: u64,
    tree: Arc<PointTree>,
}

#[derive(Clone)]
pub struct PointFeed {
    tx: Arc<watch::Sender<Published>>,
}

impl PointFeed {
    pub fn new(initial: PointTree) -> Self {
        let (tx, _) = watch::channel(Published {
            version: 0,
            tree: Arc::new(initial),
        });
        Self { tx: Arc::new(tx) }
    }

    /// Replaces the published tree and returns the new version.
    pub fn publish(&self, tree: PointTree) -> u64 {
        let mut version = 0;
        self.tx.send_modify(|published| {
            published.version += 1;
            published.tree = Arc::new(tree);
            version = published.version;
        });
        version
    }

    pub fn version(&self) -> u64 {
        self.tx.borrow().version
    }

    pub fn current(&self, query: &PointQuery) -> Snapshot {
        let published = self.tx.borrow().clone();
        to_snapshot(&published, query)
    }

    pub fn subscribe(&self, query: PointQuery) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            query,
            primed: false,
        }
    }
}

/// Lazy sequence of snapshots for one query. The first call to
/// [`Subscription::next`] resolves immediately with the current state;
/// later calls wait for the next publish. Dropping it unsubscribes.
pub struct Subscription {
    rx: watch::Receiver<Published>,
    query: PointQuery,
    primed: bool,
}

impl Subscription {
    /// `None` once the feed has been dropped.
    pub async fn next(&mut self) -> Option<Snapshot> {
        if self.primed {
            self.rx.changed().await.ok()?;
        }
        self.primed = true;
        let published = self.rx.borrow_and_update().clone();
        Some(to_snapshot(&published, &self.query))
    }
}

fn to_snapshot(published: &Published, query: &PointQuery) -> Snapshot {
    Snapshot {
        version: published.version,
        points: query.select(&published.tree, Local::now().date_naive()),
    }
}
