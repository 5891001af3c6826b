use crate::data_structures::FormValues;
use chrono::NaiveDate;
use std::fmt::Write;
use stock_analyzer::formatters::{format_optional, format_price};
use stock_analyzer::models::{AnalysisReport, LineChart, PriceBar, RenderModel, SummaryStatistics};

const LINE_COLORS: [&str; 4] = ["#3b82f6", "#f59e0b", "#22c55e", "#ef4444"];

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full dashboard page: sidebar form plus whatever the render model holds.
pub fn render_page(service_name: &str, form: &FormValues, model: &RenderModel) -> String {
    let mut html = String::with_capacity(64 * 1024);

    write!(html, r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Stock Market Analyzer | {}</title>
<style>
:root {{ --bg:#ffffff; --card:#f8fafc; --border:#e2e8f0; --fg:#0f172a; --muted:#64748b; --ok:#15803d; --warn:#b45309; --err:#b91c1c; }}
* {{ box-sizing:border-box; }}
body {{ margin:0; display:flex; font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif; color:var(--fg); background:var(--bg); }}
aside {{ width:260px; min-height:100vh; padding:24px; background:var(--card); border-right:1px solid var(--border); }}
main {{ flex:1; padding:24px 32px; max-width:1000px; }}
label {{ display:block; font-size:0.8rem; color:var(--muted); margin:12px 0 4px; }}
input {{ width:100%; padding:6px 8px; border:1px solid var(--border); border-radius:4px; }}
button {{ margin-top:16px; width:100%; padding:8px; border:0; border-radius:4px; background:#3b82f6; color:#fff; }}
.tagline {{ margin-top:-8px; color:var(--muted); }}
.message {{ padding:10px 14px; border-radius:6px; margin-bottom:16px; }}
.success {{ background:#dcfce7; color:var(--ok); }}
.warning {{ background:#fef3c7; color:var(--warn); }}
.error {{ background:#fee2e2; color:var(--err); }}
table {{ border-collapse:collapse; font-size:0.8rem; margin-bottom:24px; }}
th, td {{ padding:4px 10px; border-bottom:1px solid var(--border); text-align:right; }}
th:first-child, td:first-child {{ text-align:left; }}
svg {{ display:block; margin-bottom:24px; }}
</style>
</head>
<body>
<aside>
<h2>User Input</h2>
<form method="get" action="/">
<label for="symbol">Enter Stock Symbol</label>
<input id="symbol" name="symbol" type="text" value="{}">
<label for="start">Start Date</label>
<input id="start" name="start" type="date" value="{}" max="{}">
<label for="end">End Date</label>
<input id="end" name="end" type="date" value="{}" max="{}">
<button type="submit">Load</button>
</form>
</aside>
<main>
<h1>Stock Market Analyzer</h1>
<p class="tagline">Professional Stock Data Visualization App</p>
"#,
        escape_html(service_name),
        escape_html(&form.symbol),
        escape_html(&form.start),
        escape_html(&form.max_date),
        escape_html(&form.end),
        escape_html(&form.max_date),
    )
    .ok();

    match model {
        RenderModel::Idle => {}
        RenderModel::Rejected { message } => write_message(&mut html, "error", message),
        RenderModel::NoData { message, .. } => write_message(&mut html, "warning", message),
        RenderModel::Failed { message, .. } => write_message(&mut html, "error", message),
        RenderModel::Ready(report) => write_report(&mut html, report),
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn write_message(html: &mut String, class: &str, message: &str) {
    write!(html, r#"<div class="message {}">{}</div>"#, class, escape_html(message)).ok();
}

fn write_report(html: &mut String, report: &AnalysisReport) {
    write_message(html, "success", &report.message);

    write!(html, "<h3>Raw Stock Data (Last {} Rows)</h3>", report.tail.len()).ok();
    write_price_table(html, &report.tail);

    html.push_str("<h3>Closing Price</h3>");
    write_line_chart_svg(html, &report.closing_chart);

    html.push_str("<h3>Closing Price with Moving Averages</h3>");
    write_line_chart_svg(html, &report.overlay_chart);

    html.push_str("<h3>Statistical Summary</h3>");
    write_statistics_table(html, &report.statistics);
}

fn write_price_table(html: &mut String, bars: &[PriceBar]) {
    html.push_str("<table><thead><tr>");
    for h in ["Date", "Open", "High", "Low", "Close", "Volume"] {
        write!(html, "<th>{}</th>", h).ok();
    }
    html.push_str("</tr></thead><tbody>");
    for bar in bars {
        write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            bar.date,
            format_price(bar.open),
            format_price(bar.high),
            format_price(bar.low),
            format_price(bar.close),
            bar.volume
        )
        .ok();
    }
    html.push_str("</tbody></table>");
}

fn write_statistics_table(html: &mut String, statistics: &SummaryStatistics) {
    html.push_str("<table><thead><tr><th></th>");
    for column in &statistics.columns {
        write!(html, "<th>{}</th>", escape_html(&column.column)).ok();
    }
    html.push_str("</tr></thead><tbody>");
    for (i, label) in SummaryStatistics::ROW_LABELS.iter().enumerate() {
        write!(html, "<tr><td>{}</td>", label).ok();
        for column in &statistics.columns {
            write!(html, "<td>{}</td>", format_optional(column.rows()[i].1)).ok();
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
}

/// Render a date/price line chart as inline SVG. Absent values split a line into segments.
pub fn write_line_chart_svg(html: &mut String, chart: &LineChart) {
    let (Some((min_v, max_v)), Some((first, last))) = (chart.value_bounds(), chart.date_bounds()) else {
        return;
    };

    let w: f64 = 900.0;
    let h: f64 = 320.0;
    let pad_left = 64.0;
    let pad_top = if chart.title.is_some() { 30.0 } else { 12.0 };
    let pad_bottom = 40.0;
    let chart_w = w - pad_left - 16.0;
    let chart_h = h - pad_top - pad_bottom;

    let range = (max_v - min_v).max(f64::EPSILON);
    let span_days = (last - first).num_days().max(1) as f64;
    let x_of = |date: NaiveDate| pad_left + chart_w * ((date - first).num_days() as f64 / span_days);
    let y_of = |value: f64| pad_top + chart_h * (1.0 - (value - min_v) / range);

    write!(html, r##"<svg width="100%" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg" style="max-width:{}px">"##, w, h, w as i64).ok();

    if let Some(title) = &chart.title {
        write!(html, r##"<text x="{}" y="18" font-size="14" text-anchor="middle" fill="#0f172a">{}</text>"##, w / 2.0, escape_html(title)).ok();
    }

    // Grid lines
    for i in 0..5 {
        let y = pad_top + chart_h * (i as f64 / 4.0);
        let val = max_v - range * (i as f64 / 4.0);
        write!(html, r##"<line x1="{}" y1="{:.1}" x2="{}" y2="{:.1}" stroke="#e2e8f0" stroke-dasharray="3,3"/>"##, pad_left, y, w - 16.0, y).ok();
        write!(html, r##"<text x="{}" y="{:.1}" fill="#64748b" font-size="10" text-anchor="end">{:.2}</text>"##, pad_left - 4.0, y + 3.0, val).ok();
    }

    // Date ticks at both ends and the middle
    let mid = first + chrono::Duration::days((last - first).num_days() / 2);
    for date in [first, mid, last] {
        write!(html, r##"<text x="{:.1}" y="{:.1}" fill="#64748b" font-size="10" text-anchor="middle">{}</text>"##, x_of(date), pad_top + chart_h + 14.0, date).ok();
    }

    write!(html, r##"<text x="{}" y="{}" fill="#64748b" font-size="11" text-anchor="middle">{}</text>"##, pad_left + chart_w / 2.0, h - 6.0, escape_html(&chart.x_label)).ok();
    write!(html, r##"<text x="12" y="{}" fill="#64748b" font-size="11" text-anchor="middle" transform="rotate(-90 12 {})">{}</text>"##, pad_top + chart_h / 2.0, pad_top + chart_h / 2.0, escape_html(&chart.y_label)).ok();

    for (idx, line) in chart.lines.iter().enumerate() {
        let mut path = String::with_capacity(line.points.len() * 16);
        let mut pen_down = false;
        for (date, value) in &line.points {
            match value {
                Some(v) => {
                    let cmd = if pen_down { 'L' } else { 'M' };
                    write!(path, "{}{:.1},{:.1} ", cmd, x_of(*date), y_of(*v)).ok();
                    pen_down = true;
                }
                None => pen_down = false,
            }
        }
        if path.is_empty() {
            continue;
        }
        let color = LINE_COLORS[idx % LINE_COLORS.len()];
        write!(html, r##"<path d="{}" fill="none" stroke="{}" stroke-width="1.5"><title>{}</title></path>"##, path.trim_end(), color, escape_html(&line.label)).ok();
    }

    if chart.show_legend {
        for (idx, line) in chart.lines.iter().enumerate() {
            let x = pad_left + 10.0 + idx as f64 * 90.0;
            let color = LINE_COLORS[idx % LINE_COLORS.len()];
            write!(html, r##"<rect x="{}" y="{}" width="12" height="3" fill="{}"/>"##, x, pad_top + 6.0, color).ok();
            write!(html, r##"<text x="{}" y="{}" font-size="11" fill="#0f172a">{}</text>"##, x + 16.0, pad_top + 10.0, escape_html(&line.label)).ok();
        }
    }

    html.push_str("</svg>");
}
