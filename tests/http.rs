use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeatmapResponse {
    version: u64,
    point_count: usize,
    rows: usize,
    cols: usize,
    max_density: u32,
    cells: Vec<serde_json::Value>,
    hotspots: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
    recorded: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    session_id: String,
    record: Option<serde_json::Value>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("kiosk_heatmap_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/session")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_kiosk_heatmap"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("HEARTBEAT_SECS", "1")
        .env("MOVE_SAMPLE_RATE", "1")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn heatmap(client: &Client, base_url: &str, query: &str) -> HeatmapResponse {
    client
        .get(format!("{base_url}/api/heatmap?{query}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn track(client: &Client, base_url: &str, body: serde_json::Value) -> TrackResponse {
    let response = client
        .post(format!("{base_url}/api/track"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_click_shows_up_in_today_heatmap() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = heatmap(&client, &server.base_url, "range=today").await;
    assert_eq!(before.rows, 54);
    assert_eq!(before.cols, 96);

    let tracked = track(
        &client,
        &server.base_url,
        serde_json::json!({ "x": 15.2, "y": 18.7, "page": "/", "target": "news-card" }),
    )
    .await;
    assert!(tracked.recorded);

    let after = heatmap(&client, &server.base_url, "range=today").await;
    assert_eq!(after.point_count, before.point_count + 1);
    assert!(after.version > before.version);
    assert!(after.max_density >= 1);
    assert!(!after.cells.is_empty());
    assert!(!after.hotspots.is_empty());
}

#[tokio::test]
async fn http_movement_is_recorded_when_sampling_everything() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let tracked = track(
        &client,
        &server.base_url,
        serde_json::json!({ "x": 900, "y": 400, "eventType": "move", "page": "/kiosk" }),
    )
    .await;
    assert!(tracked.recorded);

    let only_kiosk = heatmap(&client, &server.base_url, "range=today&page=/kiosk").await;
    assert!(only_kiosk.point_count >= 1);
}

#[tokio::test]
async fn http_invalid_options_are_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for query in [
        "cellSize=0",
        "threshold=-1",
        "intensity=5",
        "range=yesterday",
        "width=100000&cellSize=1",
        "width=4294967295&height=4294967295&cellSize=1",
        "width=4000&height=4000&cellSize=1",
    ] {
        let response = client
            .get(format!("{}/api/heatmap?{query}", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query {query}");
    }

    let response = client
        .get(format!(
            "{}/api/heatmap.svg?width=4294967295&height=4294967295&cellSize=1",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_watch_returns_newer_snapshot() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = heatmap(&client, &server.base_url, "range=today").await;
    track(
        &client,
        &server.base_url,
        serde_json::json!({ "x": 300, "y": 300 }),
    )
    .await;

    let started = Instant::now();
    let watched: HeatmapResponse = client
        .get(format!(
            "{}/api/heatmap/watch?range=today&since={}",
            server.base_url, before.version
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(watched.version > before.version);
    assert_eq!(watched.point_count, before.point_count + 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn http_svg_and_session_endpoints() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/heatmap.svg?range=week", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert_eq!(content_type, "image/svg+xml");
    assert!(response.text().await.unwrap().starts_with("<svg"));

    let session: SessionResponse = client
        .get(format!("{}/api/session", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(session.session_id.starts_with("session_"));
    let record = session.record.expect("session record");
    assert_eq!(record["active"], serde_json::json!(true));

    let response = client
        .post(format!("{}/api/events", server.base_url))
        .json(&serde_json::json!({ "name": "", "data": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
