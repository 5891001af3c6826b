use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use stock_analyzer::{
    api::AnalyzerBuilder,
    formatters::{format_report, write_bars_csv},
    models::{DashboardInput, RenderModel},
    services::{YahooConfig, DEFAULT_BASE_URL},
    utils::{date::today_utc, init_logger},
};

#[derive(Parser)]
#[command(name = "stock-analyzer")]
#[command(about = "Fetch daily stock prices and print moving averages and summary statistics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one dashboard pass for a symbol and date range
    Analyze {
        /// Ticker symbol (e.g. AAPL, BRK-B, ^GSPC)
        #[arg(short, long, default_value = "AAPL")]
        symbol: String,
        /// Start date (YYYY-MM-DD), defaults to 2015-01-01
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD), exclusive, defaults to today
        #[arg(long)]
        end: Option<String>,
        /// Number of most recent rows to show
        #[arg(short, long, default_value_t = 5)]
        rows: usize,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Market data base URL
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
        /// Request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger("stock_analyzer=info")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            symbol,
            start,
            end,
            rows,
            format,
            base_url,
            timeout_secs,
        } => {
            let today = today_utc();
            let input = DashboardInput::from_fields(Some(&symbol), start.as_deref(), end.as_deref(), today)?;

            let analyzer = AnalyzerBuilder::yahoo(YahooConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
                ..YahooConfig::default()
            })?
            .with_tail_rows(rows)
            .build()?;

            let model = analyzer.analyze(&input, today).await;

            match format {
                OutputFormat::Table => println!("{}", format_report(&model)),
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&model).context("serializing render model")?;
                    println!("{}", json);
                }
                OutputFormat::Csv => match &model {
                    RenderModel::Ready(report) => {
                        write_bars_csv(std::io::stdout(), &report.query.symbol, &report.tail)?;
                    }
                    other => eprintln!("{}", format_report(other)),
                },
            }

            if let RenderModel::Failed { message, .. } = &model {
                anyhow::bail!("{}", message);
            }
        }
    }

    Ok(())
}
