use crate::compare::ComparisonReport;

/// Render a self-contained HTML comparison chart (data embedded as JSON).
///
/// Important: we avoid `format!()` because the page contains many `{}` from JS
/// template literals (e.g., `${x}`), which would conflict with Rust formatting.
pub fn render_comparison_html(report: &ComparisonReport) -> anyhow::Result<String> {
    // `</` would end the script element early if a label contained it.
    let json = serde_json::to_string(report)?.replace("</", "<\\/");

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>App Start Time Comparison</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  h1 { font-size: 18px; margin: 0; }
  .main { padding: 16px; }

  .legend { display: flex; gap: 16px; flex-wrap: wrap; font-size: 14px; color: #333; margin-bottom: 8px; }
  .swatch { display: inline-block; width: 12px; height: 12px; border-radius: 2px; margin-right: 6px; vertical-align: middle; }

  svg text { font-size: 12px; fill: #333; }
  svg .value { font-weight: bold; }
  svg .axis { stroke: #999; }

  table { border-collapse: collapse; margin-top: 16px; }
  th, td { border-bottom: 1px solid #eee; padding: 6px 10px; text-align: left; font-size: 14px; }
  th { border-bottom: 1px solid #ddd; }
  .num { text-align: right; font-variant-numeric: tabular-nums; }
  .faster { color: #1a7f37; font-weight: bold; }
  .slower { color: #cf222e; font-weight: bold; }
</style>
</head>
<body>
<header>
  <h1>Comparison of App Start Time</h1>
</header>

<div class="main">
  <div class="legend" id="legend"></div>
  <svg id="chart" width="800" height="420"></svg>

  <table id="diffTable">
    <thead id="diffHead"></thead>
    <tbody id="diffBody"></tbody>
  </table>
</div>

<script>
// Embedded report data (JSON object literal)
const DATA = __DATA__;

const COLORS = ["#1f6feb", "#2da44e", "#bf8700", "#8250df", "#cf222e", "#57606a"];
const SVG_NS = "http://www.w3.org/2000/svg";

function fmtMs(x) {
  return (Math.round(x * 10) / 10).toFixed(1);
}

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function svgEl(tag, attrs, text) {
  const el = document.createElementNS(SVG_NS, tag);
  for (const [k, v] of Object.entries(attrs)) el.setAttribute(k, v);
  if (text !== undefined) el.textContent = text;
  return el;
}

function renderLegend() {
  const el = document.getElementById("legend");
  el.innerHTML = DATA.sources.map((s, i) =>
    `<span><span class="swatch" style="background:${COLORS[i % COLORS.length]}"></span>${escapeHtml(s.label)}</span>`
  ).join("");
}

function renderChart() {
  const svg = document.getElementById("chart");
  const width = Number(svg.getAttribute("width"));
  const height = Number(svg.getAttribute("height"));
  const pad = { top: 24, right: 16, bottom: 40, left: 56 };
  const plotW = width - pad.left - pad.right;
  const plotH = height - pad.top - pad.bottom;

  let max = 0;
  for (const s of DATA.sources) for (const m of s.means) max = Math.max(max, m);
  if (max <= 0) max = 1;

  svg.appendChild(svgEl("line", { class: "axis", x1: pad.left, y1: pad.top + plotH, x2: pad.left + plotW, y2: pad.top + plotH }));
  svg.appendChild(svgEl("line", { class: "axis", x1: pad.left, y1: pad.top, x2: pad.left, y2: pad.top + plotH }));
  svg.appendChild(svgEl("text", { x: 8, y: pad.top - 8 }, "ms"));

  const groups = DATA.columns.length;
  const groupW = plotW / Math.max(groups, 1);
  const barW = Math.min(48, (groupW * 0.7) / Math.max(DATA.sources.length, 1));

  DATA.columns.forEach((col, ci) => {
    const gx = pad.left + ci * groupW + (groupW - barW * DATA.sources.length) / 2;
    DATA.sources.forEach((s, si) => {
      const v = s.means[ci] || 0;
      const h = (v / max) * plotH;
      const x = gx + si * barW;
      const y = pad.top + plotH - h;
      svg.appendChild(svgEl("rect", { x: x, y: y, width: barW - 2, height: h, fill: COLORS[si % COLORS.length] }));
      svg.appendChild(svgEl("text", { class: "value", x: x + barW / 2, y: y - 4, "text-anchor": "middle" }, fmtMs(v)));
    });
    svg.appendChild(svgEl("text", { x: pad.left + ci * groupW + groupW / 2, y: pad.top + plotH + 20, "text-anchor": "middle" }, col));
  });
}

function renderDiffs() {
  const head = document.getElementById("diffHead");
  const body = document.getElementById("diffBody");
  if (DATA.sources.length < 2) {
    document.getElementById("diffTable").style.display = "none";
    return;
  }
  const base = DATA.sources[0];
  head.innerHTML = `<tr><th>vs ${escapeHtml(base.label)}</th>` +
    DATA.columns.map(c => `<th class="num">${escapeHtml(c)}</th>`).join("") + `</tr>`;
  for (const s of DATA.sources.slice(1)) {
    const cells = DATA.columns.map((_, ci) => {
      const d = (s.means[ci] || 0) - (base.means[ci] || 0);
      const cls = d < 0 ? "faster" : (d > 0 ? "slower" : "");
      const sign = d > 0 ? "+" : "";
      return `<td class="num ${cls}">${sign}${fmtMs(d)} ms</td>`;
    }).join("");
    const tr = document.createElement("tr");
    tr.innerHTML = `<td>${escapeHtml(s.label)}</td>${cells}`;
    body.appendChild(tr);
  }
}

renderLegend();
renderChart();
renderDiffs();
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace("__DATA__", &json))
}
