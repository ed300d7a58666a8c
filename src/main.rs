use chrono::NaiveDate;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use log::error;
use meteoflow::{
    incremental_date, ApiSource, Ingestor, MeteoflowError, PipelineConfig, Warehouse,
    BACKFILL_END_DATE, BACKFILL_START_DATE,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "meteoflow")]
#[command(about = "Weather ingestion and warehouse pipeline for Open-Meteo data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, default_value = "data/raw", help = "Snapshot directory")]
    data_dir: PathBuf,

    #[arg(
        long,
        global = true,
        default_value = "data/warehouse",
        help = "Derived table directory"
    )]
    warehouse_dir: PathBuf,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch weather data for one city and write an immutable snapshot
    Ingest {
        #[arg(long)]
        city: String,

        #[arg(long, value_enum, default_value_t = Mode::Custom)]
        mode: Mode,

        #[arg(long, required_if_eq("mode", "custom"), help = "Start date (YYYY-MM-DD)")]
        start_date: Option<NaiveDate>,

        #[arg(long, required_if_eq("mode", "custom"), help = "End date (YYYY-MM-DD)")]
        end_date: Option<NaiveDate>,
    },
    /// Rebuild the staging and mart tables from the raw snapshots
    Refresh,
    /// Run the read-only warehouse health checks
    Health,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Full configured backfill window against the historical API
    Backfill,
    /// Yesterday only, against the forecast API
    Incremental,
    /// Explicit --start-date/--end-date range
    Custom,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("Run finished unsuccessfully; see logs above");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Run failed: {e}");
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool, MeteoflowError> {
    let config = PipelineConfig::new(cli.data_dir, cli.warehouse_dir);

    match cli.command {
        Commands::Ingest {
            city,
            mode,
            start_date,
            end_date,
        } => {
            // `required_if_eq` only fires when --mode is passed explicitly,
            // not when it takes its default, so the missing-dates case must
            // be handled here as well.
            let (start, end, source) = match ingestion_window(mode, start_date, end_date) {
                Some(window) => window,
                None => Cli::command()
                    .error(
                        ErrorKind::MissingRequiredArgument,
                        "--start-date and --end-date are required for custom mode",
                    )
                    .exit(),
            };

            let ingestor = Ingestor::new(config)?;
            match ingestor.run(&city, start, end, source)? {
                Some(path) => {
                    println!("Success! Data saved to: {}", path.display());
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        Commands::Refresh => {
            let report = Warehouse::new(&config).refresh()?;
            Ok(report.passed())
        }
        Commands::Health => {
            let report = Warehouse::new(&config).health_check()?;
            report.log_summary();
            Ok(report.passed())
        }
    }
}

/// Resolves the ingestion mode to a concrete date range and API endpoint.
/// `None` means custom mode was selected without both dates.
fn ingestion_window(
    mode: Mode,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Option<(NaiveDate, NaiveDate, ApiSource)> {
    match mode {
        Mode::Backfill => Some((BACKFILL_START_DATE, BACKFILL_END_DATE, ApiSource::Historical)),
        Mode::Incremental => {
            let date = incremental_date();
            Some((date, date, ApiSource::Forecast))
        }
        Mode::Custom => match (start_date, end_date) {
            (Some(start), Some(end)) => Some((start, end, ApiSource::Historical)),
            _ => None,
        },
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}
