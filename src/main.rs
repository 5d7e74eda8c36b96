//! CLI entry point for the pandemic comparison dashboard.
//!
//! Provides subcommands for each statistics fetch, a one-shot dashboard load
//! that prints the derived chart data, and a watcher that refetches the
//! comparison whenever the selected region changes.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use pandemic_compare::config::{self, Config};
use pandemic_compare::dashboard::Dashboard;
use pandemic_compare::fetch::BasicClient;
use pandemic_compare::infra::stats_service::HttpStatsApi;
use pandemic_compare::output::{append_countries, append_records, print_json};
use serde_json::json;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

type HttpDashboard = Dashboard<HttpStatsApi<BasicClient>>;

#[derive(Parser)]
#[command(name = "pandemic_compare")]
#[command(about = "Fetch and compare pandemic statistics", long_about = None)]
struct Cli {
    /// Region id to select instead of the first predefined region
    #[arg(short, long, global = true)]
    region: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List pandemics known to the statistics service
    Pandemics,
    /// List the predefined regions
    Regions,
    /// Per-country statistics for one pandemic
    Countries {
        /// Pandemic id (defaults to the first listed pandemic)
        #[arg(short, long)]
        pandemic: Option<i64>,

        /// Show every country instead of the top ten
        #[arg(long, default_value_t = false)]
        all: bool,

        /// CSV file to append rows to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Timeline of one pandemic in the selected region
    Timeline {
        /// Pandemic id (defaults to the first listed pandemic)
        #[arg(short, long)]
        pandemic: Option<i64>,

        /// CSV file to append rows to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Compare the configured pandemic pair in the selected region
    Compare {
        /// Use the configured ids instead of resolving names
        #[arg(long, default_value_t = false)]
        simple: bool,
    },
    /// List model predictions
    Predictions,
    /// Load everything concurrently and print state plus chart data
    Dashboard,
    /// Cycle through regions, refetching the comparison on each change
    Watch {
        /// Region ids to visit, in order
        #[arg(short = 'l', long, value_delimiter = ',', required = true)]
        regions: Vec<i64>,

        /// Seconds between region changes
        #[arg(short, long, default_value_t = 5)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/pandemic_compare.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("pandemic_compare.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    config.log_config();
    let dashboard = build_dashboard(&config, cli.region)?;

    match cli.command {
        Commands::Pandemics => {
            dashboard.fetch_pandemics().await;
            report_error(&dashboard);
            print_json(&dashboard.store().pandemics())?;
        }
        Commands::Regions => {
            dashboard.fetch_regions().await;
            print_json(&dashboard.store().regions())?;
        }
        Commands::Countries {
            pandemic,
            all,
            output,
        } => {
            select_pandemic(&dashboard, pandemic).await?;
            dashboard.fetch_pandemic_data().await;
            report_error(&dashboard);

            let countries = if all {
                dashboard.store().all_countries()
            } else {
                dashboard.store().countries()
            };
            match output {
                Some(path) => {
                    append_countries(&path, &countries)?;
                    info!(path, rows = countries.len(), "Country stats written");
                }
                None => print_json(&countries)?,
            }
        }
        Commands::Timeline { pandemic, output } => {
            select_pandemic(&dashboard, pandemic).await?;
            dashboard.fetch_timeline_data().await;
            report_error(&dashboard);

            let timeline = dashboard.store().timeline();
            match output {
                Some(path) => {
                    append_records(&path, &timeline)?;
                    info!(path, rows = timeline.len(), "Timeline written");
                }
                None => print_json(&timeline)?,
            }
        }
        Commands::Compare { simple } => {
            if simple {
                dashboard.fetch_comparison_data_simple().await;
            } else {
                dashboard.fetch_pandemics().await;
                dashboard.fetch_comparison_data().await;
            }
            report_error(&dashboard);
            print_comparison(&dashboard)?;
        }
        Commands::Predictions => {
            dashboard.fetch_predictions().await;
            report_error(&dashboard);
            print_json(&dashboard.store().predictions())?;
        }
        Commands::Dashboard => {
            tokio::join!(
                dashboard.fetch_regions(),
                dashboard.fetch_pandemics(),
                dashboard.fetch_predictions(),
            );
            tokio::join!(
                dashboard.fetch_pandemic_data(),
                dashboard.fetch_timeline_data(),
                dashboard.fetch_comparison_data(),
            );
            report_error(&dashboard);
            print_json(&json!({
                "state": dashboard.snapshot(),
                "pandemicStats": *dashboard.pandemic_stats(),
                "casesDeathsData": *dashboard.cases_deaths_data(),
                "mortalityData": *dashboard.mortality_data(),
                "barOptions": dashboard.bar_options(),
                "doughnutOptions": dashboard.doughnut_options(),
            }))?;
        }
        Commands::Watch { regions, interval } => {
            watch_regions(&dashboard, &regions, interval).await?;
        }
    }

    Ok(())
}

/// Wires the HTTP client, the statistics API, and the configured settings.
fn build_dashboard(config: &Config, region: Option<i64>) -> Result<HttpDashboard> {
    let client = BasicClient::new(config.request_timeout, config.connect_timeout)?;
    let api = HttpStatsApi::new(client, config.api_url.clone());
    let settings = config.dashboard_settings()?;

    let initial_region = match region {
        Some(id) => match settings.regions.find(id) {
            Some(r) => Some(r.clone()),
            None => bail!("Unknown region id {}", id),
        },
        None => None,
    };

    Ok(Dashboard::new(api, settings, initial_region))
}

/// Loads the pandemic list and selects `id`, or keeps the default selection.
async fn select_pandemic(dashboard: &HttpDashboard, id: Option<i64>) -> Result<()> {
    dashboard.fetch_pandemics().await;
    if let Some(id) = id {
        if !dashboard.select_pandemic_by_id(id) {
            bail!("Unknown pandemic id {}", id);
        }
    }
    Ok(())
}

fn print_comparison(dashboard: &HttpDashboard) -> Result<()> {
    print_json(&json!({
        "comparison": dashboard.store().comparison(),
        "pandemicStats": *dashboard.pandemic_stats(),
    }))
}

fn report_error(dashboard: &HttpDashboard) {
    if let Some(message) = dashboard.store().error() {
        error!(%message, "Dashboard error");
    }
}

/// Selects each region in turn and lets the region watcher refetch the
/// comparison, printing the result after every change.
#[tracing::instrument(skip(dashboard), fields(regions = ?regions, interval))]
async fn watch_regions(dashboard: &HttpDashboard, regions: &[i64], interval: u64) -> Result<()> {
    let watch = dashboard.spawn_region_watch();
    dashboard.mount().await;

    for &id in regions {
        if !dashboard.select_region_by_id(id) {
            warn!(region_id = id, "Unknown region, skipping");
            continue;
        }
        info!(region_id = id, interval, "Region selected");
        tokio::time::sleep(Duration::from_secs(interval)).await;

        report_error(dashboard);
        print_comparison(dashboard)?;
    }

    watch.abort();
    info!("Finished watching regions");
    Ok(())
}
