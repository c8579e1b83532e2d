use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use takeoff_core::{
    convert, derive_view_model, export_csv, export_json, CsvExportConfig, EngineConfig,
    EngineInput, MeasurementEngine, Outcome, Unit,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "takeoff")]
#[command(about = "Take-off measurement engine CLI")]
pub struct Cli {
    /// Log engine transitions to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a JSON script of input events and print the result.
    Replay {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Display unit, overrides the configuration.
        #[arg(long)]
        unit: Option<Unit>,
        /// TOML configuration file; TAKEOFF_* variables are used otherwise.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Stop at the first rejected event instead of skipping it.
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Convert a length between units.
    Convert {
        #[arg(value_name = "VALUE", allow_negative_numbers = true)]
        value: f64,
        #[arg(long)]
        from: Unit,
        #[arg(long)]
        to: Unit,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Measurement records as a JSON array
    Json,
    /// Measurement table as CSV
    Csv,
    /// Derived view model as JSON
    View,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose);

    match cli.command {
        Commands::Replay { script, format, unit, config, strict, output } => {
            run_replay(&script, format, unit, config.as_deref(), strict, output.as_deref())
        }
        Commands::Convert { value, from, to } => {
            println!("{}", convert(value, from, to));
            Ok(())
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. repeated `run` calls in one process) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_replay(
    script: &Path,
    format: OutputFormat,
    unit: Option<Unit>,
    config: Option<&Path>,
    strict: bool,
    output: Option<&Path>,
) -> Result<()> {
    ensure_file_exists(script)?;

    let mut config = match config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::from_env().context("invalid TAKEOFF_* environment")?,
    };
    if let Some(unit) = unit {
        config.display_unit = unit;
    }

    let contents = fs::read_to_string(script)
        .with_context(|| format!("failed to read script {}", script.display()))?;
    let events: Vec<EngineInput> =
        serde_json::from_str(&contents).context("failed to parse event script")?;

    let mut engine = MeasurementEngine::new(config);
    let mut rejected = 0usize;
    for (index, event) in events.into_iter().enumerate() {
        match engine.apply(event) {
            Ok(Outcome::Ignored) => tracing::debug!(event = index + 1, "event ignored"),
            Ok(outcome) => tracing::debug!(event = index + 1, ?outcome, "event applied"),
            Err(error) if strict => {
                return Err(error).with_context(|| format!("event {} rejected", index + 1));
            }
            Err(error) => {
                rejected += 1;
                tracing::warn!(event = index + 1, %error, "event rejected");
            }
        }
    }
    tracing::info!(measurements = engine.measurements().len(), rejected, "replay finished");

    let rendered = render(&engine, format)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &rendered)
                .with_context(|| format!("failed to write output to {}", path.display()))?;
            println!("{}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&rendered)?;
            if !rendered.ends_with(b"\n") {
                writeln!(stdout)?;
            }
        }
    }

    Ok(())
}

fn render(engine: &MeasurementEngine, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Json => Ok(export_json(engine)?.into_bytes()),
        OutputFormat::Csv => {
            let mut buffer = Vec::new();
            export_csv(&mut buffer, engine, &CsvExportConfig::default())?;
            Ok(buffer)
        }
        OutputFormat::View => {
            let view = derive_view_model(engine);
            Ok(serde_json::to_string_pretty(&view)?.into_bytes())
        }
    }
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
