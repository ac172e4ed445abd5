//! Revenue forecast CLI
//!
//! Command-line interface for aggregating subscription revenue and
//! forecasting it forward.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use revenue_facade::{
    tune_in_background, BlockingExecutor, ForecastConfig, ForecastConfigBuilder, ForecastInput,
    ForecastMethod, ForecastOrchestrator, ForecastOutput, ForecastTable, Progress,
    ProgressObserver, RawRecord, SmoothingParam, TunerStrategy,
};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "revenue-forecast")]
#[command(about = "Subscription revenue aggregation and forecasting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast revenue from records or a monthly series
    Forecast {
        /// Input JSON file (records or series points)
        #[arg(short, long)]
        input: PathBuf,

        /// JSON forecast configuration; flags override its fields
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Forecast method (linear, holt)
        #[arg(short, long)]
        method: Option<ForecastMethod>,

        /// Months to forecast
        #[arg(long)]
        horizon: Option<usize>,

        /// Level smoothing (a number or "auto")
        #[arg(long)]
        alpha: Option<SmoothingParam>,

        /// Trend smoothing (a number or "auto")
        #[arg(long)]
        beta: Option<SmoothingParam>,

        /// Tuner used for auto parameters (fast, advanced, grid)
        #[arg(long)]
        tuner: Option<TunerStrategy>,

        /// Replace the analytic band with bootstrap percentiles
        #[arg(long)]
        bootstrap: bool,

        /// Bootstrap trial count
        #[arg(long)]
        samples: Option<usize>,

        /// Run the bootstrap on the blocking pool
        #[arg(long = "async")]
        run_async: bool,

        /// Seed for reproducible bootstrap bands
        #[arg(long)]
        seed: Option<u64>,

        /// Include Holt residuals in the output
        #[arg(long)]
        residuals: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Aggregate records into a monthly series
    Aggregate {
        /// Input JSON file of records
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Tune Holt smoothing parameters for a series
    Tune {
        /// Input JSON file (records or series points)
        #[arg(short, long)]
        input: PathBuf,

        /// Search strategy (fast, advanced, grid)
        #[arg(short, long, default_value = "fast")]
        strategy: TunerStrategy,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

/// Load input rows from a JSON file.
///
/// Accepts a bare array or an object holding a `records` or `series` array.
fn load_records(path: &Path) -> anyhow::Result<Vec<RawRecord>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let json: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let rows = match json {
        Value::Array(rows) => rows,
        Value::Object(mut obj) => match ["records", "series", "data"]
            .iter()
            .find_map(|key| obj.remove(*key))
        {
            Some(Value::Array(rows)) => rows,
            _ => bail!("expected an array of rows in {}", path.display()),
        },
        _ => bail!("expected an array of rows in {}", path.display()),
    };

    let records: Vec<RawRecord> = rows
        .into_iter()
        .filter_map(|row| match row {
            Value::Object(map) => Some(RawRecord::from(map)),
            _ => None,
        })
        .collect();
    info!(rows = records.len(), "loaded input");
    Ok(records)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ForecastConfig> {
    let Some(path) = path else {
        return Ok(ForecastConfig::default());
    };
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("invalid forecast config in {}", path.display()))
}

fn write_output(output: Option<&Path>, body: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let mut file =
                File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            file.write_all(body.as_bytes())?;
            info!(path = %path.display(), "output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(body.as_bytes())?;
            if !body.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

fn render(output: &ForecastOutput, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(output)?),
        OutputFormat::Csv => Ok(ForecastTable::from_output(output).to_csv()?),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_forecast(
    input: PathBuf,
    config: Option<PathBuf>,
    method: Option<ForecastMethod>,
    horizon: Option<usize>,
    alpha: Option<SmoothingParam>,
    beta: Option<SmoothingParam>,
    tuner: Option<TunerStrategy>,
    bootstrap: bool,
    samples: Option<usize>,
    run_async: bool,
    seed: Option<u64>,
    residuals: bool,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let records = load_records(&input)?;

    let mut builder = ForecastConfigBuilder::from_config(load_config(config.as_deref())?);
    if let Some(method) = method {
        builder = builder.method(method);
    }
    if let Some(horizon) = horizon {
        builder = builder.horizon(horizon);
    }
    if let Some(alpha) = alpha {
        builder = builder.alpha(alpha);
    }
    if let Some(beta) = beta {
        builder = builder.beta(beta);
    }
    if let Some(tuner) = tuner {
        builder = builder.tuner(tuner);
    }
    if bootstrap || samples.is_some() {
        let samples = samples.unwrap_or(builder.config().holt.bootstrap_samples);
        builder = builder.bootstrap(samples);
    }
    if run_async {
        builder = builder.bootstrap_async(true);
    }
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    if residuals {
        builder = builder.return_residuals(true);
    }
    let config = builder.build();

    let orchestrator = ForecastOrchestrator::new();
    let outcome = orchestrator.compute(ForecastInput::detect(records), &config);
    if outcome.is_pending() {
        info!("waiting for background bootstrap");
    }
    let result = outcome.resolve().await?;

    match &result.forecast_result {
        Some(forecast) => info!(
            method = forecast.method_name(),
            months = result.monthly_series.len(),
            points = forecast.forecast().len(),
            residual_std = forecast.residual_std(),
            "forecast complete"
        ),
        None => info!(
            months = result.monthly_series.len(),
            "not enough data to forecast"
        ),
    }

    write_output(output.as_deref(), &render(&result, format)?)
}

fn run_aggregate(input: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let records = load_records(&input)?;
    let orchestrator = ForecastOrchestrator::new();
    let series = orchestrator
        .monthly_series(&ForecastInput::Records(records))
        .unwrap_or_default();
    info!(months = series.len(), "aggregation complete");
    write_output(output.as_deref(), &serde_json::to_string_pretty(&series)?)
}

async fn run_tune(input: PathBuf, strategy: TunerStrategy) -> anyhow::Result<()> {
    let records = load_records(&input)?;
    let orchestrator = ForecastOrchestrator::new();
    let totals: Vec<f64> = orchestrator
        .monthly_series(&ForecastInput::detect(records))
        .unwrap_or_default()
        .iter()
        .map(|point| point.total)
        .collect();

    let observer: Arc<dyn ProgressObserver> = Arc::new(|progress: &Progress| {
        info!(
            completed = progress.completed,
            total = progress.total,
            best = ?progress.best.map(|best| best.score),
            "tuning {:.0}%",
            progress.percent()
        );
    });
    let result =
        tune_in_background(&BlockingExecutor::new(), totals, strategy, Some(observer)).await?;

    info!(alpha = result.alpha, beta = result.beta, mse = result.score, "tuning complete");
    write_output(None, &serde_json::to_string_pretty(&result)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "revenue_forecast=info,revenue_core=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Forecast {
            input,
            config,
            method,
            horizon,
            alpha,
            beta,
            tuner,
            bootstrap,
            samples,
            run_async,
            seed,
            residuals,
            format,
            output,
        } => {
            run_forecast(
                input, config, method, horizon, alpha, beta, tuner, bootstrap, samples, run_async,
                seed, residuals, format, output,
            )
            .await
        }
        Commands::Aggregate { input, output } => run_aggregate(input, output),
        Commands::Tune { input, strategy } => run_tune(input, strategy).await,
    }
}
