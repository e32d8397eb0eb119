use crate::heatmap::Overlay;

pub fn render_index(date: &str, point_count: usize, overlay: &Overlay) -> String {
    INDEX_HTML
        .replace("{{DATE}}", date)
        .replace("{{POINTS}}", &point_count.to_string())
        .replace("{{HOTSPOTS}}", &overlay.hotspots.len().to_string())
        .replace("{{MAX}}", &overlay.max_density.to_string())
        .replace("{{INTENSITY}}", &overlay.intensity.to_string())
        .replace("{{OVERLAY}}", &overlay.to_svg())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Kiosk Heatmap</title>
  <style>
    :root {
      --bg-1: #eef2f7;
      --ink: #1f2933;
      --muted: #616e7c;
      --accent: #e4572e;
      --card: rgba(255, 255, 255, 0.92);
      --shadow: 0 24px 60px rgba(31, 41, 51, 0.14);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #dde6f0 60%, #f6f8fb 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(1200px, 100%);
      background: var(--card);
      border-radius: 24px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.8rem, 3vw, 2.4rem);
    }

    .subtitle {
      margin: 4px 0 0;
      color: var(--muted);
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 16px;
    }

    .stat {
      background: #fff;
      border-radius: 16px;
      padding: 16px 20px;
      box-shadow: 0 8px 20px rgba(31, 41, 51, 0.08);
    }

    .stat span {
      display: block;
      color: var(--muted);
      font-size: 0.85rem;
    }

    .stat strong {
      font-size: 1.8rem;
    }

    .controls {
      display: flex;
      flex-wrap: wrap;
      gap: 16px;
      align-items: center;
    }

    .canvas svg {
      width: 100%;
      height: auto;
      border-radius: 12px;
      display: block;
    }

    .legend {
      display: flex;
      align-items: center;
      gap: 12px;
      color: var(--muted);
    }

    .legend .bar {
      flex: 1;
      height: 12px;
      border-radius: 6px;
      background: linear-gradient(90deg, #0000ff, #00ffff, #00ff00, #ffff00, #ff0000);
    }

    .status {
      min-height: 1.2em;
      color: var(--accent);
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Kiosk Heatmap</h1>
      <p class="subtitle">Pointer activity for <span id="date">{{DATE}}</span></p>
    </header>

    <section class="panel">
      <div class="stat"><span>Tracked points</span><strong id="points">{{POINTS}}</strong></div>
      <div class="stat"><span>Hotspots</span><strong id="hotspots">{{HOTSPOTS}}</strong></div>
      <div class="stat"><span>Densest cell</span><strong id="max">{{MAX}}</strong></div>
    </section>

    <section class="controls">
      <label>Range
        <select id="range">
          <option value="today">Today</option>
          <option value="week">Last 7 days</option>
          <option value="all">Everything</option>
        </select>
      </label>
      <label>Intensity <span id="intensity-label">{{INTENSITY}}</span>%
        <input id="intensity" type="range" min="10" max="100" value="{{INTENSITY}}" />
      </label>
      <a id="download" href="/api/heatmap.svg" download="heatmap.svg">Download</a>
    </section>

    <section class="canvas" id="canvas">{{OVERLAY}}</section>

    <div class="legend"><span>Low</span><div class="bar"></div><span>High</span></div>
    <p class="status" id="status"></p>
  </main>

  <script>
    const rangeEl = document.getElementById('range');
    const intensityEl = document.getElementById('intensity');
    const canvasEl = document.getElementById('canvas');
    const statusEl = document.getElementById('status');
    let version = 0;

    const params = () =>
      new URLSearchParams({ range: rangeEl.value, intensity: intensityEl.value });

    const setStatus = (message) => {
      statusEl.textContent = message;
    };

    const updateStats = (data) => {
      version = data.version;
      document.getElementById('points').textContent = data.pointCount;
      document.getElementById('hotspots').textContent = data.hotspots.length;
      document.getElementById('max').textContent = data.maxDensity;
    };

    const redraw = async () => {
      const query = params();
      document.getElementById('download').href = `/api/heatmap.svg?${query}`;
      const [svgRes, dataRes] = await Promise.all([
        fetch(`/api/heatmap.svg?${query}`),
        fetch(`/api/heatmap?${query}`)
      ]);
      if (!svgRes.ok || !dataRes.ok) {
        throw new Error('Unable to load heatmap');
      }
      canvasEl.innerHTML = await svgRes.text();
      updateStats(await dataRes.json());
    };

    const watch = async () => {
      for (;;) {
        try {
          const query = params();
          query.set('since', version);
          const res = await fetch(`/api/heatmap/watch?${query}`);
          if (!res.ok) {
            throw new Error(await res.text());
          }
          const data = await res.json();
          if (data.version !== version) {
            await redraw();
          }
        } catch (err) {
          setStatus(err.message);
          await new Promise((resolve) => setTimeout(resolve, 5000));
        }
      }
    };

    document.addEventListener('click', (event) => {
      const target = event.target.id || event.target.className || event.target.tagName;
      fetch('/api/track', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({
          x: event.clientX,
          y: event.clientY,
          eventType: 'click',
          page: window.location.pathname,
          target: String(target)
        })
      }).catch((err) => setStatus(err.message));
    });

    rangeEl.addEventListener('change', () => redraw().catch((err) => setStatus(err.message)));
    intensityEl.addEventListener('input', () => {
      document.getElementById('intensity-label').textContent = intensityEl.value;
      redraw().catch((err) => setStatus(err.message));
    });

    redraw().then(watch).catch((err) => setStatus(err.message));
  </script>
</body>
</html>
"#;
