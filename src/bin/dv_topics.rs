use std::fs::{self, File};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dataverse_topic_updater::app::{App, PipelineOptions};
use dataverse_topic_updater::config::{Settings, validate_input_path};
use dataverse_topic_updater::dataverse::DataverseHttpClient;
use dataverse_topic_updater::domain::{ReleaseType, UpdateStrategy};
use dataverse_topic_updater::error::UpdaterError;
use dataverse_topic_updater::input::{ColumnNames, read_rows};
use dataverse_topic_updater::output::ConsoleOutput;

#[derive(Parser)]
#[command(name = "dv-topics")]
#[command(about = "Batch-add topic classifications to Dataverse datasets from a CSV")]
#[command(version, author)]
struct Cli {
    /// CSV mapping dataset DOIs to classification triplets
    csv: PathBuf,

    /// Name of the DOI column in the CSV
    #[arg(short = 'd', long, default_value = "DOI")]
    doi_column: String,

    /// Name of the classification-triplets column in the CSV
    #[arg(short = 't', long, default_value = "FINAL TRIPLETS")]
    topics_column: String,

    /// How the update is written: a JSON-LD merge of the topic field, or a
    /// full replacement of the draft version document
    #[arg(long, value_enum, default_value_t = UpdateStrategy::Metadata)]
    strategy: UpdateStrategy,

    /// Release type used when a published dataset is re-published
    #[arg(long, value_enum, default_value_t = ReleaseType::Minor)]
    release_type: ReleaseType,

    /// Directory the run log is written into
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(updater) = report.downcast_ref::<UpdaterError>() {
            return ExitCode::from(map_exit_code(updater));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &UpdaterError) -> u8 {
    match error {
        UpdaterError::MissingEnv(_)
        | UpdaterError::InputNotFound(_)
        | UpdaterError::InputNotCsv(_)
        | UpdaterError::MissingColumn(_)
        | UpdaterError::InputRead { .. } => 2,
        UpdaterError::DataverseHttp(_)
        | UpdaterError::DataverseStatus { .. }
        | UpdaterError::DataverseDecode(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let stamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
    init_logging(&cli.log_dir, &stamp)?;

    let settings = Settings::from_env()?;
    validate_input_path(&cli.csv)?;

    let columns = ColumnNames {
        doi: cli.doi_column,
        topics: cli.topics_column,
    };
    let rows = read_rows(&cli.csv, &columns)?;
    info!(
        csv = %cli.csv.display(),
        rows = rows.len(),
        strategy = ?cli.strategy,
        "starting topic-classification update run"
    );

    let client = DataverseHttpClient::new(&settings.base_url, &settings.api_key)?;
    let app = App::new(
        client,
        PipelineOptions {
            strategy: cli.strategy,
            release_type: cli.release_type,
        },
    );

    ConsoleOutput::print_banner(rows.len()).into_diagnostic()?;
    let report = app.run(&rows, &ConsoleOutput);

    let report_path = PathBuf::from(format!("topic-update-report-{stamp}.csv"));
    report.write_csv(&report_path)?;

    let log_path = log_file_path(&cli.log_dir, &stamp);
    ConsoleOutput::print_summary(&report, &log_path, &report_path).into_diagnostic()?;
    Ok(())
}

fn log_file_path(log_dir: &std::path::Path, stamp: &str) -> PathBuf {
    log_dir.join(format!("topic-update-{stamp}.log"))
}

/// One log file per run; INFO and up unless RUST_LOG overrides.
fn init_logging(log_dir: &std::path::Path, stamp: &str) -> Result<(), UpdaterError> {
    let path = log_file_path(log_dir, stamp);
    fs::create_dir_all(log_dir).map_err(|err| UpdaterError::LogSetup {
        path: path.clone(),
        message: err.to_string(),
    })?;
    let file = File::create(&path).map_err(|err| UpdaterError::LogSetup {
        path: path.clone(),
        message: err.to_string(),
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .init();
    Ok(())
}
