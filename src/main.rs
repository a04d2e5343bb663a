use analytics::synthetic::monthly_price_path;
use analytics::{AnalyticsEngine, PerformanceReport, SeededRng};
use api_client::{QuoteSource, YahooClient, validate_ticker};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use configuration::{LogFormat, Settings};
use core_types::{MonthlyObservation, PricePoint};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

/// The main entry point for the Value Lab application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment overrides from a .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut settings = configuration::load_config_from(&cli.config)?;
    if let Some(format) = cli.log_format {
        settings.logging.format = format;
    }
    let _guard = configuration::init_tracing(&settings.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Metrics(args) => handle_metrics(args, &settings).await,
        Commands::Simulate(args) => handle_simulate(args, &settings),
        Commands::Serve(args) => {
            if let Some(port) = args.port {
                settings.server.port = port;
            }
            web_server::run_server(settings).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Performance metrics for mutual funds and ETFs.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path of the configuration file. A missing file means built-in defaults.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides the configured log format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch monthly histories and print performance metrics.
    Metrics(MetricsArgs),
    /// Print metrics of a reproducible synthetic fund.
    Simulate(SimulateArgs),
    /// Run the HTTP API.
    Serve(ServeArgs),
}

#[derive(Parser)]
struct MetricsArgs {
    /// One or more tickers (e.g., "VFIAX").
    #[arg(required = true)]
    tickers: Vec<String>,

    /// Benchmark ticker. Defaults to `metrics.default_benchmark`.
    #[arg(long)]
    benchmark: Option<String>,

    /// Skip the benchmark comparison.
    #[arg(long, conflicts_with = "benchmark")]
    no_benchmark: bool,

    /// Print the full reports as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct SimulateArgs {
    /// Seed of the random generator. The same seed always gives the same series.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of monthly returns to generate.
    #[arg(long, default_value_t = 120)]
    periods: usize,

    /// Mean monthly return of the synthetic fund.
    #[arg(long, default_value_t = 0.008)]
    mean: f64,

    /// Standard deviation of the monthly returns.
    #[arg(long, default_value_t = 0.045)]
    volatility: f64,
}

#[derive(Parser)]
struct ServeArgs {
    /// Overrides `server.port`.
    #[arg(long)]
    port: Option<u16>,
}

// ==============================================================================
// Metrics Command Logic
// ==============================================================================

/// Fetches every ticker concurrently and prints one row per fund.
async fn handle_metrics(args: MetricsArgs, settings: &Settings) -> anyhow::Result<()> {
    let client: Arc<dyn QuoteSource> = Arc::new(YahooClient::new(&settings.provider)?);
    let engine = web_server::engine_from_settings(&settings.metrics);

    let benchmark = if args.no_benchmark {
        None
    } else {
        let ticker = args.benchmark.as_deref().unwrap_or(&settings.metrics.default_benchmark);
        Some(validate_ticker(ticker)?)
    };
    let tickers = args
        .tickers
        .iter()
        .map(|t| validate_ticker(t))
        .collect::<Result<Vec<_>, _>>()?;

    // Set up the progress bar
    let progress_bar = ProgressBar::new((tickers.len() + usize::from(benchmark.is_some())) as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
    );

    // Create concurrent tasks for the benchmark and each ticker
    let fetch = |ticker: String| {
        let client = client.clone();
        let pb = progress_bar.clone();
        tokio::spawn(async move {
            pb.set_message(format!("Fetching {ticker}..."));
            let result = client.fetch_monthly(&ticker).await;
            pb.inc(1);
            (ticker, result)
        })
    };
    let benchmark_task = benchmark.clone().map(fetch);
    let tasks: Vec<_> = tickers.into_iter().map(fetch).collect();

    let benchmark_prices = match benchmark_task {
        Some(task) => {
            let (ticker, result) = task.await?;
            let series = result.map_err(|e| anyhow::anyhow!("benchmark {ticker}: {e}"))?;
            Some(prices(&series))
        }
        None => None,
    };
    let results = join_all(tasks).await;
    progress_bar.finish_with_message("Download complete!");

    let mut reports = Vec::new();
    for joined in results {
        let (ticker, result) = joined?;
        let report = result
            .map_err(anyhow::Error::from)
            .and_then(|series| {
                engine
                    .calculate(&prices(&series), benchmark_prices.as_deref())
                    .map_err(anyhow::Error::from)
            });
        match report {
            Ok(report) => reports.push((ticker, report)),
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "Skipping ticker.");
                eprintln!("{ticker}: {e}");
            }
        }
    }

    if args.json {
        let by_ticker: serde_json::Map<String, serde_json::Value> = reports
            .iter()
            .map(|(ticker, report)| Ok((ticker.clone(), serde_json::to_value(report)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&by_ticker)?);
    } else {
        println!("{}", report_table(&reports, benchmark.as_deref()));
    }
    Ok(())
}

fn prices(series: &[MonthlyObservation]) -> Vec<PricePoint> {
    series.iter().map(MonthlyObservation::price_point).collect()
}

// ==============================================================================
// Simulate Command Logic
// ==============================================================================

fn handle_simulate(args: SimulateArgs, settings: &Settings) -> anyhow::Result<()> {
    let engine = web_server::engine_from_settings(&settings.metrics);
    let reports = simulate(&engine, &args)?;
    println!("{}", report_table(&reports, Some("SIM-BENCH")));
    Ok(())
}

/// A synthetic fund and a calmer synthetic benchmark drawn from the same seed.
fn simulate(
    engine: &AnalyticsEngine,
    args: &SimulateArgs,
) -> anyhow::Result<Vec<(String, PerformanceReport)>> {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1)
        .ok_or_else(|| anyhow::anyhow!("invalid start date"))?;
    let mut rng = SeededRng::new(args.seed);
    let fund_returns = rng.returns(args.periods, args.mean, args.volatility);
    let benchmark_returns = rng.returns(args.periods, args.mean * 0.75, args.volatility * 0.8);

    let fund = monthly_price_path(start, 100.0, &fund_returns);
    let benchmark = monthly_price_path(start, 100.0, &benchmark_returns);

    Ok(vec![
        (format!("SIM-{}", args.seed), engine.calculate(&fund, Some(&benchmark))?),
        ("SIM-BENCH".to_string(), engine.calculate(&benchmark, None)?),
    ])
}

// ==============================================================================
// Output
// ==============================================================================

fn report_table(reports: &[(String, PerformanceReport)], benchmark: Option<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![
        "Ticker",
        "Period (yrs)",
        "CAGR %",
        "Max DD %",
        "Volatility %",
        "Sharpe",
        "Sortino",
        "Hit %",
    ];
    if benchmark.is_some() {
        header.extend(["IR", "Alpha 3y %", "Alpha 5y %", "Alpha 10y %"]);
    }
    table.set_header(header);

    for (ticker, report) in reports {
        let mut row = vec![
            ticker.clone(),
            format!("{:.1}", report.years),
            percent(report.cagr),
            percent(report.max_drawdown),
            percent(report.volatility),
            ratio(report.sharpe_ratio),
            ratio(report.sortino_ratio),
            percent(report.hit_ratio),
        ];
        if benchmark.is_some() {
            match &report.benchmark {
                Some(comparison) => row.extend([
                    ratio(comparison.information_ratio),
                    comparison.alpha_3yr.map_or_else(|| "-".to_string(), percent),
                    comparison.alpha_5yr.map_or_else(|| "-".to_string(), percent),
                    comparison.alpha_10yr.map_or_else(|| "-".to_string(), percent),
                ]),
                None => row.extend(std::iter::repeat_n("-".to_string(), 4)),
            }
        }
        table.add_row(
            row.into_iter()
                .enumerate()
                .map(|(i, text)| {
                    let cell = Cell::new(text);
                    if i == 0 { cell } else { cell.set_alignment(CellAlignment::Right) }
                }),
        );
    }
    table
}

/// A decimal as a percentage with two decimals (0.1234 -> "12.34").
fn percent(value: f64) -> String {
    format!("{:.2}", value * 100.0)
}

fn ratio(value: f64) -> String {
    if value == f64::INFINITY {
        "∞".to_string()
    } else if value == f64::NEG_INFINITY {
        "-∞".to_string()
    } else {
        format!("{value:.2}")
    }
}
