use std::time::Duration;

pub fn render_index(source: &str, refresh_interval: Duration) -> String {
    INDEX_HTML
        .replace("{{SOURCE}}", source)
        .replace("{{REFRESH_MS}}", &refresh_interval.as_millis().to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Reservoir Storage Dashboard</title>
  <script src="https://cdn.jsdelivr.net/npm/chart.js@4"></script>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef5f8;
      --bg-2: #b9dbe8;
      --ink: #22313a;
      --accent: #1f7a8c;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e2f0f4 60%, #f4f9fb 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(1180px, 100%);
      margin: 0 auto;
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
    }

    .subtitle {
      margin: 0;
      color: #5f6c72;
      font-size: 1rem;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 8px;
    }

    .stat .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #7d8a90;
    }

    .stat .value {
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .charts {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(320px, 1fr));
      gap: 20px;
    }

    .chart-card {
      background: white;
      border-radius: 18px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      height: 360px;
      position: relative;
    }

    [hidden] {
      display: none !important;
    }

    .status {
      min-height: 1.2em;
      font-size: 0.9rem;
      color: #5f6c72;
    }

    .status[data-type="error"] {
      color: #b3261e;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Reservoir Storage</h1>
      <p class="subtitle">Source: {{SOURCE}}. Updated <span id="generated">never</span>.</p>
    </header>

    <section class="panel" data-kind="dams" hidden>
      <div class="stat">
        <span class="label">Total dams</span>
        <span id="total-dams" class="value">--</span>
      </div>
      <div class="stat">
        <span class="label">Average storage</span>
        <span id="avg-storage" class="value">--</span>
      </div>
      <div class="stat">
        <span class="label">Dams above 90%</span>
        <span id="dams-above-90" class="value">--</span>
      </div>
    </section>

    <section class="charts" data-kind="dams" hidden>
      <div class="chart-card"><canvas id="storageByDistrictChart"></canvas></div>
      <div class="chart-card"><canvas id="storageByTypeChart"></canvas></div>
      <div class="chart-card"><canvas id="topDamsChart"></canvas></div>
      <div class="chart-card"><canvas id="damsByTalukaChart"></canvas></div>
      <div class="chart-card"><canvas id="percentageBucketsChart"></canvas></div>
    </section>

    <section class="charts" data-kind="districts" hidden>
      <div class="chart-card"><canvas id="districtPie"></canvas></div>
      <div class="chart-card"><canvas id="talukaBar"></canvas></div>
      <div class="chart-card"><canvas id="districtCompare"></canvas></div>
      <div class="chart-card"><canvas id="talukaLine"></canvas></div>
      <div class="chart-card"><canvas id="talukaDist"></canvas></div>
    </section>

    <section class="charts" data-kind="labeled" hidden>
      <div class="chart-card"><canvas id="valuesPie"></canvas></div>
      <div class="chart-card"><canvas id="valuesBar"></canvas></div>
      <div class="chart-card"><canvas id="valuesLine"></canvas></div>
    </section>

    <div class="status" id="status"></div>
  </main>

  <script>
    const REFRESH_MS = {{REFRESH_MS}};
    const PALETTE = ['#1f7a8c', '#28a745', '#ffc107', '#dc3545', '#17a2b8', '#6f42c1', '#fd7e14', '#2f4858'];
    const statusEl = document.getElementById('status');
    const charts = {};

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const setText = (id, value) => {
      const el = document.getElementById(id);
      if (el) {
        el.textContent = value;
      }
    };

    // Updates a chart in place, or creates it on first use.
    const draw = (id, type, data, options) => {
      try {
        if (charts[id]) {
          charts[id].data = data;
          charts[id].update();
          return;
        }
        const canvas = document.getElementById(id);
        if (!canvas) {
          console.error(`missing chart container #${id}`);
          return;
        }
        charts[id] = new Chart(canvas.getContext('2d'), {
          type,
          data,
          options: Object.assign({ responsive: true, maintainAspectRatio: false }, options)
        });
      } catch (err) {
        console.error(`failed to draw #${id}`, err);
      }
    };

    const titled = (text, extra) => Object.assign({ plugins: { title: { display: true, text } } }, extra || {});
    const labels = (series) => series.points.map((p) => p.label);
    const values = (series) => series.points.map((p) => p.value);

    const renderDams = (d) => {
      setText('total-dams', d.kpis.total_dams);
      setText('avg-storage', `${d.kpis.avg_percentage.toFixed(1)}%`);
      setText('dams-above-90', d.kpis.dams_above_90);

      draw('storageByDistrictChart', 'doughnut', {
        labels: labels(d.storage_by_district),
        datasets: [{ data: values(d.storage_by_district), backgroundColor: PALETTE }]
      }, titled('Total Water Storage by District'));

      draw('storageByTypeChart', 'bar', {
        labels: labels(d.storage_by_type),
        datasets: [{ label: 'Total Storage (MCFT)', data: values(d.storage_by_type), backgroundColor: '#28a745' }]
      }, titled('Total Storage by Project Type', { scales: { y: { beginAtZero: true } } }));

      draw('topDamsChart', 'bar', {
        labels: labels(d.top_dams),
        datasets: [{ label: 'Total Storage (MCFT)', data: values(d.top_dams), backgroundColor: '#ffc107' }]
      }, titled('Top 10 Dams by Total Storage', { indexAxis: 'y', scales: { x: { beginAtZero: true } } }));

      draw('damsByTalukaChart', 'bar', {
        labels: labels(d.dams_by_taluka),
        datasets: [{ label: 'Number of Dams', data: values(d.dams_by_taluka), backgroundColor: '#dc3545' }]
      }, titled('Number of Dams per Taluka', { indexAxis: 'y', scales: { x: { beginAtZero: true, ticks: { stepSize: 1 } } } }));

      draw('percentageBucketsChart', 'bar', {
        labels: d.percentage_buckets.map((b) => b.label),
        datasets: [{ label: 'Dams', data: d.percentage_buckets.map((b) => b.count), backgroundColor: PALETTE }]
      }, titled('Dams by Storage %', { plugins: { title: { display: true, text: 'Dams by Storage %' }, legend: { display: false } } }));
    };

    const renderDistricts = (d) => {
      draw('districtPie', 'doughnut', {
        labels: labels(d.district_storage),
        datasets: [{ data: values(d.district_storage), backgroundColor: PALETTE }]
      }, titled('Water Storage by District'));

      draw('talukaBar', 'bar', {
        labels: labels(d.taluka_percent),
        datasets: [{ label: 'Storage %', data: values(d.taluka_percent), backgroundColor: '#1f7a8c' }]
      }, titled('Storage % by Taluka', { indexAxis: 'y', scales: { x: { min: 0, max: 100 } } }));

      draw('districtCompare', 'bar', {
        labels: d.district_compare.map((p) => p.label),
        datasets: [
          { label: 'This Year', data: d.district_compare.map((p) => p.current), backgroundColor: '#1f7a8c' },
          { label: 'Last Year', data: d.district_compare.map((p) => p.previous), backgroundColor: '#ffc107' }
        ]
      }, titled('Current vs Last Year Storage (Districts)'));

      draw('talukaLine', 'line', {
        labels: d.taluka_capacity.map((p) => p.label),
        datasets: [
          { label: 'Capacity', data: d.taluka_capacity.map((p) => p.current), borderColor: '#2f4858', tension: 0.4 },
          { label: 'Storage', data: d.taluka_capacity.map((p) => p.previous), borderColor: '#28a745', tension: 0.4 }
        ]
      }, titled('Taluka Capacity vs Current Storage'));

      draw('talukaDist', 'bar', {
        labels: d.taluka_distribution.map((b) => `${b.label} (${b.members.join(', ')})`),
        datasets: [{ label: 'Talukas', data: d.taluka_distribution.map((b) => b.count), backgroundColor: PALETTE }]
      }, titled('Distribution of Talukas by % Filled', { indexAxis: 'y' }));
    };

    const renderLabeled = (d) => {
      draw('valuesPie', 'pie', {
        labels: labels(d.values),
        datasets: [{ data: values(d.values), backgroundColor: PALETTE }]
      }, titled('Share by Label'));

      draw('valuesBar', 'bar', {
        labels: labels(d.values),
        datasets: [{ label: 'Value', data: values(d.values), backgroundColor: '#1f7a8c' }]
      }, titled('Value by Label', { scales: { y: { beginAtZero: true } } }));

      draw('valuesLine', 'line', {
        labels: labels(d.values),
        datasets: [{ label: 'Value', data: values(d.values), borderColor: '#2f4858', fill: false, tension: 0.3 }]
      }, titled('Value Trend', { scales: { y: { beginAtZero: true } } }));
    };

    const showKind = (kind) => {
      document.querySelectorAll('[data-kind]').forEach((section) => {
        section.hidden = section.dataset.kind !== kind;
      });
    };

    const loadDashboard = async () => {
      const res = await fetch('/api/dashboard');
      if (!res.ok) {
        throw new Error((await res.text()) || 'Unable to load dashboard');
      }
      const dashboard = await res.json();
      showKind(dashboard.kind);
      if (dashboard.kind === 'dams') {
        renderDams(dashboard);
      } else if (dashboard.kind === 'districts') {
        renderDistricts(dashboard);
      } else if (dashboard.kind === 'labeled') {
        renderLabeled(dashboard);
      }
      setText('generated', new Date(dashboard.generated_at).toLocaleString());
      setStatus(dashboard.defaulted_fields ? `${dashboard.defaulted_fields} empty or unreadable cells were counted as zero.` : '', '');
    };

    const refresh = () => loadDashboard().catch((err) => {
      console.error('Error building the dashboard:', err);
      setStatus(err.message, 'error');
    });

    refresh();
    setInterval(refresh, REFRESH_MS);
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_embeds_source_and_interval() {
        let html = render_index("gviz", Duration::from_secs(30));
        assert!(html.contains("Source: gviz."));
        assert!(html.contains("const REFRESH_MS = 30000;"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn labeled_view_has_pie_bar_and_line() {
        let html = render_index("values", Duration::from_secs(60));
        for id in ["valuesPie", "valuesBar", "valuesLine"] {
            assert!(html.contains(&format!("<canvas id=\"{id}\">")), "missing canvas {id}");
        }
        assert!(html.contains("draw('valuesLine', 'line'"));
    }
}
