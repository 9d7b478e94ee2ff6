//! pond CLI
//!
//! Command-line front end over the pond library. Reads a series in the JSON
//! wire format, runs one transform over it and writes the result back out in
//! the same format:
//! - Inspect a series
//! - Align to a fixed grid
//! - Compute rates of change
//! - Fill missing values
//! - Roll up into fixed or calendar windows

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pond::config::{generate_default_config, Config};
use pond::pipeline::{AlignMethod, AlignOptions, FillMethod, FillOptions, RateOptions};
use pond::reducer::Reducer;
use pond::{FieldPath, TimeSeries};

#[derive(Parser)]
#[command(name = "pond")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Time-series event processing")]
#[command(long_about = "pond reads a time series in its JSON wire format, runs a transform\nover it and prints the resulting series.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(short, long, global = true)]
    pub pretty: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a summary of a series
    Info {
        /// Input file, or - for stdin
        input: String,
    },

    /// Align events to a fixed time grid
    Align {
        /// Input file, or - for stdin
        input: String,
        /// Grid spacing (e.g., 30s, 5m, 1h)
        #[arg(short, long)]
        window: Option<String>,
        /// Interpolation method (linear, hold)
        #[arg(short, long)]
        method: Option<String>,
        /// Maximum boundaries to fill between two events
        #[arg(short, long)]
        limit: Option<usize>,
        /// Fields to align (default: value)
        #[arg(short, long)]
        field: Vec<String>,
    },

    /// Compute per-second rates between consecutive events
    Rate {
        /// Input file, or - for stdin
        input: String,
        /// Fields to differentiate (default: value)
        #[arg(short, long)]
        field: Vec<String>,
        /// Replace negative rates with null
        #[arg(long)]
        no_negative: bool,
    },

    /// Fill missing values
    Fill {
        /// Input file, or - for stdin
        input: String,
        /// Fill method (zero, pad, linear)
        #[arg(short, long)]
        method: Option<String>,
        /// Maximum consecutive fills per field
        #[arg(short, long)]
        limit: Option<usize>,
        /// Fields to fill (default: every field, or value for linear)
        #[arg(short, long)]
        field: Vec<String>,
    },

    /// Aggregate into windows
    Rollup {
        /// Input file, or - for stdin
        input: String,
        /// Window (e.g., 5m, 1h, daily, monthly, yearly)
        #[arg(short, long)]
        window: Option<String>,
        /// Aggregations as [output=]path:reducer (e.g., total=value:sum)
        #[arg(short, long, required = true)]
        aggregate: Vec<String>,
        /// Emit point events at window centres instead of indexed events
        #[arg(long)]
        to_events: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_logging(&config);

    match cli.command {
        Commands::Info { input } => {
            let series = read_series(&input)?;
            println!("name:    {}", series.name());
            println!("events:  {}", series.size());
            match series.range() {
                Some(range) => println!("range:   {}", range),
                None => println!("range:   (empty)"),
            }
            if let Some(index) = series.index_as_string() {
                println!("index:   {}", index);
            }
            println!("utc:     {}", series.is_utc());
            println!("columns: {}", series.columns().join(", "));
            for column in series.columns() {
                let path = FieldPath::new([column.as_str()]);
                println!(
                    "  {:<16} valid={} avg={} min={} max={}",
                    column,
                    series.size_valid(path.clone()),
                    series.avg(path.clone()),
                    series.min(path.clone()),
                    series.max(path.clone()),
                );
            }
        }

        Commands::Align {
            input,
            window,
            method,
            limit,
            field,
        } => {
            let series = read_series(&input)?;
            let method = match method {
                Some(m) => m.parse::<AlignMethod>()?,
                None => config.pipeline.align_method()?,
            };
            let mut options = AlignOptions::new()
                .window(window.unwrap_or_else(|| config.pipeline.window.clone()))
                .method(method);
            if let Some(limit) = limit {
                options = options.limit(limit);
            }
            if !field.is_empty() {
                options = options.field_spec(field.iter().map(String::as_str));
            }
            tracing::info!(series = series.name(), "Aligning {} events", series.size());
            write_series(&series.align(options)?, cli.pretty)?;
        }

        Commands::Rate {
            input,
            field,
            no_negative,
        } => {
            let series = read_series(&input)?;
            let mut options =
                RateOptions::new().allow_negative(config.pipeline.allow_negative && !no_negative);
            if !field.is_empty() {
                options = options.field_spec(field.iter().map(String::as_str));
            }
            write_series(&series.rate(options)?, cli.pretty)?;
        }

        Commands::Fill {
            input,
            method,
            limit,
            field,
        } => {
            let series = read_series(&input)?;
            let method = match method {
                Some(m) => m.parse::<FillMethod>()?,
                None => config.pipeline.fill_method()?,
            };
            let mut options = FillOptions::new().method(method);
            if let Some(limit) = limit.or(config.pipeline.fill_limit) {
                options = options.fill_limit(limit);
            }
            if !field.is_empty() {
                options = options.field_spec(field.iter().map(String::as_str));
            }
            write_series(&series.fill(options)?, cli.pretty)?;
        }

        Commands::Rollup {
            input,
            window,
            aggregate,
            to_events,
        } => {
            let series = read_series(&input)?;
            let window = window.unwrap_or_else(|| config.pipeline.window.clone());
            let fields = aggregate
                .iter()
                .map(|spec| parse_aggregation(spec))
                .collect::<Result<Vec<_>>>()?;
            tracing::info!(series = series.name(), %window, "Rolling up {} events", series.size());
            let rolled = series.fixed_window_rollup(&window, fields, to_events)?;
            write_series(&rolled, cli.pretty)?;
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays a clean series
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pond={}", config.logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_series(input: &str) -> Result<TimeSeries> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?
    };

    let series = TimeSeries::from_json_str(&content)
        .with_context(|| format!("Invalid series in {}", input))?;
    tracing::debug!(series = series.name(), "Read {} events", series.size());
    Ok(series)
}

fn write_series(series: &TimeSeries, pretty: bool) -> Result<()> {
    let json = series.to_json();
    let text = if pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    println!("{}", text);
    Ok(())
}

/// Parse `[output=]path:reducer`
fn parse_aggregation(spec: &str) -> Result<(String, String, Reducer)> {
    let (output, rest) = match spec.split_once('=') {
        Some((output, rest)) => (Some(output.trim()), rest),
        None => (None, spec),
    };
    let Some((path, reducer_name)) = rest.split_once(':') else {
        bail!("Invalid aggregation '{}': expected [output=]path:reducer", spec);
    };
    let reducer = Reducer::from_name(reducer_name.trim())
        .ok_or_else(|| anyhow!("Unknown reducer '{}'", reducer_name))?;
    let path = path.trim().to_string();
    let output = match output {
        Some(output) => output.to_string(),
        None => format!("{}_{}", path.replace('.', "_"), reducer.name()),
    };
    Ok((output, path, reducer))
}
