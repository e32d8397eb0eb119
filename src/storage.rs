use crate::errors::AppError;
use crate::feed::PointFeed;
use crate::models::AppData;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error, warn};

/// Shared handle to the JSON-backed analytics data. Every mutation goes
/// through [`Store::update`], which persists the file and republishes points.
#[derive(Clone)]
pub struct Store {
    path: PathBuf,
    data: Arc<Mutex<AppData>>,
    feed: PointFeed,
}

impl Store {
    pub fn new(path: PathBuf, data: AppData) -> Self {
        let feed = PointFeed::new(data.heatmap.clone());
        Self {
            path,
            data: Arc::new(Mutex::new(data)),
            feed,
        }
    }

    pub async fn open(path: PathBuf) -> Result<Self, AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let data = load_data(&path).await;
        Ok(Self::new(path, data))
    }

    pub fn feed(&self) -> &PointFeed {
        &self.feed
    }

    pub async fn read<T>(&self, f: impl FnOnce(&AppData) -> T) -> T {
        let data = self.data.lock().await;
        f(&data)
    }

    /// Applies `f` to a copy of the data and commits it only once the file
    /// write succeeds, so a failed persist leaves memory and the feed untouched.
    pub async fn update<T>(&self, f: impl FnOnce(&mut AppData) -> T) -> Result<T, AppError> {
        let mut data = self.data.lock().await;
        let before = point_total(&data);
        let mut next = data.clone();
        let out = f(&mut next);
        persist_data(&self.path, &next).await?;
        *data = next;
        if point_total(&data) != before {
            let version = self.feed.publish(data.heatmap.clone());
            debug!(version, "published point snapshot");
        }
        Ok(out)
    }
}

fn point_total(data: &AppData) -> usize {
    data.heatmap.values().map(Vec::len).sum()
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "no data file yet, starting empty");
            AppData::default()
        }
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

/// Writes to a sibling temp file and renames it over `path`, so readers
/// never observe a half-written document.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data)?;
    let tmp = temp_sibling(path);
    fs::write(&tmp, payload).await?;
    if let Err(err) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
