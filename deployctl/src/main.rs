//! deployctl - Entry Point
//!
//! Requests an application process on a deployment server from a job file,
//! waits for the result and harvests application properties.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use deployctl::deploy::{DeploymentOrchestrator, OrchestratorOptions};
use deployctl::filesys::file::File;
use deployctl::http::client::HttpClient;
use deployctl::logs::{init_logging, LogLevel, LogOptions};
use deployctl::models::request::DeploymentRequest;
use deployctl::request::RequestBuilder;
use deployctl::storage::job::DeployJob;
use deployctl::storage::layout::StorageLayout;
use deployctl::storage::property_store::FilePropertyStore;
use deployctl::storage::settings::Settings;
use deployctl::utils::{parse_key_value, version_info};
use deployctl::vars::EnvVars;

#[derive(Parser)]
#[command(name = "deployctl")]
#[command(about = "Deploy application processes to a deployment server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct JobArgs {
    /// Settings file; defaults to settings.json in the storage directory
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Deploy job file
    #[arg(short, long)]
    job: PathBuf,

    /// Variable available to $NAME expansion, as KEY=VALUE
    #[arg(long = "var", value_parser = parse_key_value)]
    vars: Vec<(String, String)>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a deploy job
    Deploy {
        #[command(flatten)]
        args: JobArgs,

        /// Return as soon as the process is requested
        #[arg(long)]
        skip_wait: bool,
    },
    /// Check a deploy job without contacting the server
    Validate {
        #[command(flatten)]
        args: JobArgs,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Version => match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => {
                println!("{}", version);
                ExitCode::SUCCESS
            }
            Err(e) => report(&e.into()),
        },
        Commands::Validate { args } => match validate(args).await {
            Ok(request) => {
                println!(
                    "{} {} -> {} ({})",
                    "VALID".green().bold(),
                    request.application(),
                    request.environment(),
                    request.process()
                );
                ExitCode::SUCCESS
            }
            Err(e) => report(&e),
        },
        Commands::Deploy { args, skip_wait } => match deploy(args, skip_wait).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => report(&e),
        },
    }
}

fn report(err: &anyhow::Error) -> ExitCode {
    eprintln!("{} {:#}", "FAILED".red().bold(), err);
    ExitCode::FAILURE
}

/// Settings plus the logging guard that must outlive the command
struct Session {
    settings: Settings,
    layout: StorageLayout,
    _log_guard: Option<WorkerGuard>,
}

async fn start_session(args: &JobArgs) -> Result<Session> {
    let layout = StorageLayout::default();
    let settings_file = args
        .settings
        .clone()
        .map(File::new)
        .unwrap_or_else(|| layout.settings_file());
    let settings = Settings::load(&settings_file)
        .await
        .with_context(|| format!("Unable to load settings from {}", settings_file.path().display()))?;

    let log_options = LogOptions {
        log_level: args.log_level.clone().unwrap_or_else(|| settings.log_level.clone()),
        log_dir: settings.log_dir.clone(),
        json_format: settings.log_json,
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    Ok(Session {
        settings,
        layout,
        _log_guard,
    })
}

async fn load_job(args: &JobArgs, skip_wait: bool) -> Result<(DeployJob, DeploymentRequest)> {
    let job_file = File::new(args.job.clone());
    let mut job = DeployJob::load(&job_file)
        .await
        .with_context(|| format!("Unable to load deploy job from {}", job_file.path().display()))?;
    job.deploy.skip_wait |= skip_wait;

    let mut vars = EnvVars::from_process_env();
    for (key, value) in &args.vars {
        vars.insert(key.clone(), value.clone());
    }
    let request = RequestBuilder::new(&vars)
        .build(&job.deploy)
        .context("Invalid deploy block")?;
    Ok((job, request))
}

async fn validate(args: JobArgs) -> Result<DeploymentRequest> {
    let _session = start_session(&args).await?;
    let (job, request) = load_job(&args, false).await?;
    job.alt_user()?;
    Ok(request)
}

async fn deploy(args: JobArgs, skip_wait: bool) -> Result<()> {
    let Session {
        settings,
        layout,
        _log_guard,
    } = start_session(&args).await?;
    let (job, request) = load_job(&args, skip_wait).await?;

    let client = match job.alt_user()? {
        Some(user) => {
            info!("Running job as user '{}'", user.alt_username);
            HttpClient::with_credentials(
                &settings.server,
                &user.alt_username,
                user.alt_password.clone(),
            )?
        }
        None => HttpClient::new(&settings.server)?,
    };

    let store_file = settings
        .property_store
        .clone()
        .map(File::new)
        .unwrap_or_else(|| layout.property_store_file());
    let store = Arc::new(FilePropertyStore::new(store_file));

    let orchestrator = DeploymentOrchestrator::new(
        Arc::new(client),
        store,
        OrchestratorOptions {
            monitor: settings.polling.monitor_options(),
            harvest_properties: settings.harvest_properties,
        },
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            await_shutdown_signal().await;
            cancel.cancel();
        }
    });

    match orchestrator.run(&request, &cancel).await {
        Ok(outcome) => {
            info!(
                harvested = outcome.harvested,
                finished_at = %outcome.finished_at.to_rfc3339(),
                "Deployment of '{}' complete",
                request.application()
            );
            let status = outcome
                .status
                .as_ref()
                .map_or("REQUESTED".to_string(), |s| s.to_string());
            println!(
                "{} {} in {:.1}s: {}",
                status.green().bold(),
                outcome.request_id,
                outcome.duration.as_secs_f64(),
                outcome.audit_url
            );
            Ok(())
        }
        Err(e) => {
            error!("Deployment of '{}' failed", request.application());
            Err(e.into())
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!("Unable to listen for SIGTERM: {}", e);
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Ctrl+C received, interrupting wait...");
                }
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, interrupting wait...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, interrupting wait...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, interrupting wait...");
        }
    }
}
