//! Plain-text and CSV renderings of a render model for the terminal.

use crate::models::{AnalysisReport, PriceBar, RenderModel, SummaryStatistics};

/// Format price with two decimals
pub fn format_price(value: f64) -> String {
    format!("{:.2}", value)
}

/// Format an optional statistic, "NaN" when absent
pub fn format_optional(value: Option<f64>) -> String {
    match value {
        Some(v) if v.abs() >= 1e9 => format!("{:.6e}", v),
        Some(v) => format!("{:.6}", v),
        None => "NaN".to_string(),
    }
}

fn pad_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            if i == 0 {
                format!("{:<width$}", cell, width = width)
            } else {
                format!("{:>width$}", cell, width = width)
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn render_table(header: Vec<String>, rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut lines = vec![pad_row(&header, &widths)];
    lines.extend(rows.iter().map(|row| pad_row(row, &widths)));
    lines.join("\n")
}

/// Last rows of the series as a text table
pub fn format_price_table(bars: &[PriceBar]) -> String {
    let header = ["Date", "Open", "High", "Low", "Close", "Volume"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows = bars
        .iter()
        .map(|bar| {
            vec![
                bar.date.format("%Y-%m-%d").to_string(),
                format_price(bar.open),
                format_price(bar.high),
                format_price(bar.low),
                format_price(bar.close),
                bar.volume.to_string(),
            ]
        })
        .collect();
    render_table(header, rows)
}

/// Describe-style statistics table: one row per statistic, one column per series column
pub fn format_statistics_table(statistics: &SummaryStatistics) -> String {
    let mut header = vec![String::new()];
    header.extend(statistics.columns.iter().map(|c| c.column.clone()));

    let rows = SummaryStatistics::ROW_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let mut row = vec![label.to_string()];
            row.extend(statistics.columns.iter().map(|c| format_optional(c.rows()[i].1)));
            row
        })
        .collect();
    render_table(header, rows)
}

/// Latest value of every moving average, e.g. "MA 100: 152.31"
pub fn format_latest_averages(report: &AnalysisReport) -> String {
    report
        .derived
        .averages
        .iter()
        .map(|ma| match ma.latest() {
            Some(value) => format!("{}: {}", ma.label(), format_price(value)),
            None => format!("{}: not enough data", ma.label()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full terminal report for any render model state
pub fn format_report(model: &RenderModel) -> String {
    match model {
        RenderModel::Idle => "Enter a stock symbol to load data.".to_string(),
        RenderModel::Rejected { message } => format!("Invalid input: {}", message),
        RenderModel::NoData { message, .. } => message.clone(),
        RenderModel::Failed { kind, message, .. } => format!("Fetch failed ({}): {}", kind, message),
        RenderModel::Ready(report) => {
            let first = report.series.first_date().map(|d| d.to_string()).unwrap_or_default();
            let last = report.series.last_date().map(|d| d.to_string()).unwrap_or_default();
            format!(
                "{}\n{}: {} bars from {} to {}\n\n# Raw Stock Data (Last {} Rows)\n{}\n\n# Moving Averages\n{}\n\n# Statistical Summary\n{}",
                report.message,
                report.query.symbol,
                report.series.len(),
                first,
                last,
                report.tail.len(),
                format_price_table(&report.tail),
                format_latest_averages(report),
                format_statistics_table(&report.statistics),
            )
        }
    }
}

/// Bars as CSV with a header row
pub fn write_bars_csv<W: std::io::Write>(writer: W, symbol: &str, bars: &[PriceBar]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["symbol", "date", "open", "high", "low", "close", "volume"])?;
    for bar in bars {
        wtr.write_record([
            symbol.to_string(),
            bar.date.format("%Y-%m-%d").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
