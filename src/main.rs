use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use dockscope_docker::{DockerClient, SourceProvider};
use dockscope_logs::{FilterConfig, LevelFlags, LevelSelection, RunReport, Severity, StreamAggregator};
use dockscope_term::{ColorMode, TerminalSink};

mod config;

use config::{CliOptions, FileConfig, Settings};

/// Dockscope - Follow and filter the logs of every container on a Docker network
#[derive(Parser, Debug)]
#[command(name = "dockscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Docker network whose containers are followed
    #[arg(short, long)]
    network: Option<String>,

    /// Show all logs (the default when no level is selected)
    #[arg(long)]
    all: bool,

    /// Show error logs
    #[arg(long)]
    errors: bool,

    /// Show warning logs
    #[arg(long)]
    warnings: bool,

    /// Show info logs
    #[arg(long)]
    info: bool,

    /// Show debug logs
    #[arg(long)]
    debug: bool,

    /// Comma-separated log levels to show (error,warn,info,debug)
    #[arg(long, value_delimiter = ',')]
    levels: Vec<String>,

    /// Additional keywords that always pass, comma-separated
    #[arg(long, value_delimiter = ',')]
    filter: Vec<String>,

    /// Only follow containers whose name contains one of these, comma-separated
    #[arg(long, value_delimiter = ',')]
    service: Vec<String>,

    /// History to replay per container before following ("all" or a line count)
    #[arg(long)]
    tail: Option<String>,

    /// Stop following a container that logs nothing for this many seconds
    #[arg(long, value_name = "SECS")]
    idle_timeout: Option<u64>,

    /// When to color output: auto, always or never
    #[arg(long, value_name = "WHEN")]
    color: Option<ColorMode>,

    /// Docker socket to connect to instead of the local default
    #[arg(long, value_name = "PATH")]
    docker_socket: Option<String>,

    /// TOML file with default settings
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log more about what dockscope itself is doing (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn cli_options(&self) -> CliOptions {
        CliOptions {
            network: self.network.clone(),
            levels: LevelFlags {
                all: self.all,
                errors: self.errors,
                warnings: self.warnings,
                info: self.info,
                debug: self.debug,
                levels: self.levels.clone(),
            },
            filter: self.filter.clone(),
            service: self.service.clone(),
            tail: self.tail.clone(),
            idle_timeout_secs: self.idle_timeout,
            color: self.color,
            docker_socket: self.docker_socket.clone(),
        }
    }

    fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Diagnostics go to stderr; stdout only carries log lines
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(args.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(args.cli_options(), file)?;

    let filter = FilterConfig::new(LevelSelection::from_flags(&settings.levels))
        .with_keywords(&settings.keywords)
        .with_source_filters(&settings.services);
    tracing::debug!(?filter, "filter configured");

    let client = match &settings.docker_socket {
        Some(socket) => DockerClient::connect_with_socket(socket)?,
        None => DockerClient::connect_local()?,
    }
    .with_tail(settings.tail.clone());
    client
        .ping()
        .await
        .context("Docker daemon is not reachable")?;

    let network = settings.network.as_str();
    let sources = client
        .list_sources(network)
        .await
        .with_context(|| format!("Failed to find network '{}'", network))?;

    if sources.is_empty() {
        eprintln!("No containers found in network '{}'.", network);
        return Ok(());
    }

    eprintln!("Monitoring logs for network '{}'...", network);

    let cancel = CancellationToken::new();
    tokio::spawn(stop_on_signal(cancel.clone()));

    let sink = TerminalSink::stdout(settings.color.theme_for_stdout());
    let aggregator = StreamAggregator::new(Arc::new(client), sink, filter)
        .with_cancel(&cancel)
        .with_idle_timeout(settings.idle_timeout);

    let report = aggregator.run(sources).await;
    log_summary(&report);

    Ok(())
}

/// Cancel the run on Ctrl+C or SIGTERM
async fn stop_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    eprintln!("\nStopping log monitor...");
    cancel.cancel();
}

fn log_summary(report: &RunReport) {
    let emitted = report.emitted();
    tracing::info!(
        sources = report.workers.len(),
        skipped = report.skipped.len(),
        failed = report.failures().count(),
        lines_read = report.lines_read(),
        emitted = emitted.total(),
        errors = emitted.get(Severity::Error),
        warnings = emitted.get(Severity::Warning),
        "log monitor finished"
    );

    for (source, error) in report.failures() {
        tracing::debug!(source = %source.display_name(), error = %error, "source failed");
    }
}
