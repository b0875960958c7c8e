use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod dashboard;
mod db;
mod error;
mod metrics;
mod models;
mod period;
mod report;
mod sfmc;
mod tabular;

#[cfg(test)]
mod stub_server;

use config::ApiConfig;
use period::PeriodFilter;
use sfmc::SfmcClient;

#[derive(Parser)]
#[command(name = "expansion-report")]
#[command(about = "Email and goal KPIs for the J7 network expansion program", long_about = None)]
struct Cli {
    /// Log filter directive, e.g. `info` or `network_expansion_report=debug`
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace a table in the local SQLite store with the contents of a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "data")]
        table: String,
        #[arg(long, env = "DATABASE_URL", default_value = "sqlite://data.db")]
        database_url: String,
        #[arg(long, default_value_t = 10)]
        preview_rows: usize,
    },
    /// Fetch the Data Extension and render the KPI report
    Report {
        #[command(flatten)]
        api: ApiConfig,
        /// A `yearMonth` value, or "All period"
        #[arg(long, default_value = period::ALL_PERIOD)]
        period: PeriodFilter,
        /// Write the report here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the periods that can be passed to `report --period`
    Periods {
        #[command(flatten)]
        api: ApiConfig,
    },
}

fn setup_logging(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match cli.command {
        Commands::Import {
            csv,
            table,
            database_url,
            preview_rows,
        } => {
            let upload = tabular::read_csv_path(&csv)
                .with_context(|| format!("failed to read {}", csv.display()))?;
            let pool = db::connect(&database_url)
                .await
                .with_context(|| format!("failed to open {database_url}"))?;

            let inserted = db::replace_table(&pool, &table, &upload).await?;
            let stored = db::count_rows(&pool, &table).await?;
            println!(
                "Loaded {inserted} rows from {} into table `{table}` ({stored} rows stored).",
                csv.display()
            );
            print!("{}", upload.preview(preview_rows));
        }
        Commands::Report { api, period, out } => {
            let client = SfmcClient::new(api).context("failed to build HTTP client")?;
            let outcome = dashboard::load(&client, &period).await;
            if let Err(err) = &outcome {
                tracing::debug!(error = ?err, "report could not be built");
            }

            let rendered = report::render_outcome(&outcome, chrono::Utc::now());
            match (&outcome, out) {
                (Ok(_), Some(path)) => {
                    std::fs::write(&path, rendered)?;
                    println!("Report written to {}.", path.display());
                }
                _ => print!("{rendered}"),
            }

            if outcome.is_err() {
                std::process::exit(1);
            }
        }
        Commands::Periods { api } => {
            let client = SfmcClient::new(api).context("failed to build HTTP client")?;
            let token = client.get_access_token().await?;
            let records = client.get_rows(&token).await?;

            for period in period::available_periods(&records) {
                println!("{period}");
            }
        }
    }

    Ok(())
}
