use brightdoor::api::ContactApiClient;
use brightdoor::credentials::CredentialContext;
use brightdoor::gateway::HttpGateway;
use brightdoor::service::{self, ServiceError};
use brightdoor::settings::{FileSettingsStore, SettingsError, SettingsStore};
use brightdoor::sync::LogSink;
use brightdoor::{BrightDoorError, FeedConfig, SubmissionRecord, SyncOrchestrator, SyncStatus};
use clap::{Args, Parser};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

mod config;
mod logging;
mod metrics;

use config::{Config, ConfigError};

#[derive(Parser)]
enum CliCommand {
    /// Run the HTTP service the form host notifies.
    Serve(ConfigArgs),
    /// Check the stored credentials against BrightDoor.
    AuthTest(ConfigArgs),
    /// Sync a single submission and print the result.
    Notify(NotifyArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config: PathBuf,
}

#[derive(Args)]
struct NotifyArgs {
    #[arg(long)]
    config: PathBuf,
    /// Feed configuration (YAML).
    #[arg(long)]
    feed: PathBuf,
    /// Submitted form values (JSON object).
    #[arg(long)]
    submission: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Metrics(#[from] metrics::MetricsError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    BrightDoor(#[from] BrightDoorError),
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse feed: {0}")]
    Feed(#[from] serde_yaml::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliCommand::parse();
    let config_path = match &cli {
        CliCommand::Serve(args) | CliCommand::AuthTest(args) => &args.config,
        CliCommand::Notify(args) => &args.config,
    };

    let config = match Config::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let _sentry = logging::init(config.common.logging.as_ref());

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "formbridge failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: CliCommand, config: Config) -> Result<ExitCode, CliError> {
    metrics::init(config.common.metrics.as_ref())?;

    match cli {
        CliCommand::Serve(_) => {
            tracing::info!("Starting formbridge");
            service::serve(config.bridge, Arc::new(LogSink)).await?;
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::AuthTest(_) => auth_test(&config).await,
        CliCommand::Notify(args) => notify(&config, &args).await,
    }
}

async fn auth_test(config: &Config) -> Result<ExitCode, CliError> {
    let settings = FileSettingsStore::new(&config.bridge.settings.path).load()?;
    let credentials = CredentialContext::from_settings(&settings)?;
    let api = ContactApiClient::new(HttpGateway::new(
        config.bridge.brightdoor.base_url.clone(),
        credentials,
    ));

    match api.auth_test().await {
        Ok(_) => {
            println!("BrightDoor credentials are valid");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn notify(config: &Config, args: &NotifyArgs) -> Result<ExitCode, CliError> {
    let feed: FeedConfig = serde_yaml::from_str(&read(&args.feed)?)?;
    let submission: SubmissionRecord = serde_json::from_str(&read(&args.submission)?)?;
    let settings = FileSettingsStore::new(&config.bridge.settings.path).load()?;

    let orchestrator =
        SyncOrchestrator::new(config.bridge.brightdoor.base_url.clone(), Arc::new(LogSink));
    let outcome = orchestrator.notify(&settings, &feed, &submission).await;

    println!("{}", serde_json::to_string(&outcome.report)?);
    Ok(match outcome.report.status {
        SyncStatus::Failed => ExitCode::FAILURE,
        SyncStatus::Success | SyncStatus::Skipped => ExitCode::SUCCESS,
    })
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}
