use clap::{Args, Parser, Subcommand};
use csv_adapter::{CsvCleanedWriter, CsvRawRecordSink, CsvTableSource};
use export_adapter::ExportChannelClient;
use sqlite_adapter::SqliteCleanedStore;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use telescrape_core::application::{CollectionService, CollectorSettings, NormalizationService};
use telescrape_core::domain::Credentials;
use telescrape_core::normalizer::NormalizerOptions;
use telescrape_core::ports::{CleanedWriter, Reporter};
use telescrape_core::reporter::TracingReporter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Scrapes channel messages into a CSV table and cleans that table for loading
#[derive(Parser, Debug)]
#[command(name = "telescrape")]
#[command(about = "Collects channel messages and normalizes them for a relational store")]
struct Cli {
    /// File that receives a copy of every log line
    #[arg(long = "log-file", env = "TELESCRAPE_LOG_FILE", default_value = "logs/pipeline.log", global = true)]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch recent messages per channel and write the raw table
    Collect(CollectArgs),
    /// Clean the raw table into the destination schema
    Normalize(NormalizeArgs),
}

#[derive(Args, Debug)]
struct CollectArgs {
    /// Directory holding one exported channel per subdirectory
    #[arg(short = 's', long = "source", env = "TELESCRAPE_SOURCE")]
    source: PathBuf,

    /// Channel handles to collect, comma separated
    #[arg(
        short = 'c',
        long = "channels",
        value_delimiter = ',',
        default_value = "DoctorsET,lobelia4cosmetics,yetenaweg,EAHCI"
    )]
    channels: Vec<String>,

    /// Messages fetched per channel
    #[arg(short = 'n', long = "limit", default_value_t = 100)]
    limit: usize,

    #[arg(long = "media-dir", default_value = "scraped_images")]
    media_dir: PathBuf,

    /// Raw table to write
    #[arg(short = 'o', long = "output", default_value = "telegram_messages.csv")]
    output: PathBuf,

    #[arg(long = "api-id", env = "TG_API_ID")]
    api_id: Option<String>,

    #[arg(long = "api-hash", env = "TG_API_HASH", hide_env_values = true)]
    api_hash: Option<String>,

    #[arg(long = "phone", env = "TG_PHONE", hide_env_values = true)]
    phone: Option<String>,
}

impl CollectArgs {
    fn credentials(&self) -> Option<Credentials> {
        Some(Credentials {
            api_id: self.api_id.clone()?,
            api_hash: self.api_hash.clone()?,
            phone: self.phone.clone()?,
        })
    }
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// Raw table produced by `collect`
    #[arg(short = 'i', long = "input", default_value = "telegram_messages.csv")]
    input: PathBuf,

    /// Cleaned table to write (overwritten)
    #[arg(short = 'o', long = "output", default_value = "cleaned_telegram_messages.csv")]
    output: PathBuf,

    /// Also replace the contents of the telegram_messages table in this SQLite database
    #[arg(long = "sqlite")]
    sqlite: Option<String>,

    /// Squeeze whitespace left behind by link removal
    #[arg(long = "collapse-whitespace")]
    collapse_whitespace: bool,
}

fn init_tracing(log_file: &Path) -> std::io::Result<()> {
    if let Some(dir) = log_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn run_collect(args: CollectArgs, reporter: &dyn Reporter) -> bool {
    let settings = CollectorSettings {
        credentials: args.credentials(),
        channels: args.channels.clone(),
        limit: args.limit,
        media_dir: args.media_dir.clone(),
    };

    let mut service = CollectionService::new(
        Box::new(ExportChannelClient::new(args.source.clone())),
        Box::new(CsvRawRecordSink::new(args.output.clone())),
        settings,
        reporter,
    );

    match service.execute() {
        Ok(summary) => {
            reporter.info(&format!(
                "Saved {} messages and {} images to {} and {}",
                summary.messages,
                summary.photos,
                args.output.display(),
                args.media_dir.display()
            ));
            true
        }
        Err(e) => {
            reporter.error(&format!("Collection failed: {}", e));
            false
        }
    }
}

fn run_normalize(args: NormalizeArgs, reporter: &dyn Reporter) -> bool {
    let mut writers: Vec<Box<dyn CleanedWriter>> =
        vec![Box::new(CsvCleanedWriter::new(args.output.clone()))];
    if let Some(db_path) = args.sqlite.clone() {
        writers.push(Box::new(SqliteCleanedStore::new(db_path)));
    }

    let service = NormalizationService::new(
        Box::new(CsvTableSource::new(args.input.clone())),
        writers,
        NormalizerOptions {
            collapse_whitespace: args.collapse_whitespace,
        },
        reporter,
    );

    match service.execute() {
        Ok(summary) => {
            reporter.info(&format!(
                "Cleaned data saved successfully to '{}' ({} of {} rows kept, {} unparseable dates, {} unparseable ids).",
                args.output.display(),
                summary.rows_written,
                summary.rows_read,
                summary.invalid_dates,
                summary.invalid_ids
            ));
            if let Some(db_path) = &args.sqlite {
                reporter.info(&format!(
                    "Loaded {} rows into {} ({}).",
                    summary.rows_written,
                    sqlite_adapter::TABLE_NAME,
                    db_path
                ));
            }
            true
        }
        // Already reported by the service
        Err(_) => false,
    }
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.log_file) {
        eprintln!("Cannot open log file {}: {}", cli.log_file.display(), e);
        std::process::exit(1);
    }

    let reporter = TracingReporter;
    let ok = match cli.command {
        Command::Collect(args) => run_collect(args, &reporter),
        Command::Normalize(args) => run_normalize(args, &reporter),
    };

    if !ok {
        std::process::exit(1);
    }
}
