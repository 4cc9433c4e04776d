mod config_commands;
mod dry_run;
mod run_commands;

use std::path::{Path, PathBuf};

use {
    anyhow::Result,
    clap::{Parser, Subcommand},
    streamwatch_config::StreamwatchConfig,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "streamwatch", about = "streamwatch: stream notifications for chat groups")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery in ./ and ~/.config/streamwatch/).
    #[arg(long, global = true, env = "STREAMWATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Route JSON-lines stream events to the configured groups.
    Run {
        /// Event file; stdin when omitted.
        #[arg(long)]
        events: Option<PathBuf>,
        /// Drop channels that no longer exist before subscribing.
        #[arg(long)]
        cleanup: bool,
    },
    /// List the channels the groups are subscribed to.
    Subscriptions {
        #[arg(long)]
        cleanup: bool,
    },
    /// Let this bot deliver to a group it had marked unreachable.
    ClearSuppression { group_id: String },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Explicit config file if given, otherwise the discovered one (or defaults).
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<StreamwatchConfig> {
    match explicit {
        Some(path) => streamwatch_config::load_config(path),
        None => Ok(streamwatch_config::discover_and_load()),
    }
}

#[cfg(feature = "metrics")]
fn init_metrics(config: &StreamwatchConfig) -> Result<streamwatch_metrics::MetricsHandle> {
    streamwatch_metrics::init_metrics(streamwatch_metrics::MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        global_labels: vec![("bot".into(), config.bot.id.clone())],
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "streamwatch starting");

    let explicit = cli.config.as_deref();
    match cli.command {
        Commands::Config { action } => config_commands::handle_config(action, explicit),
        Commands::Run { events, cleanup } => {
            let config = load_config(explicit)?;
            #[cfg(feature = "metrics")]
            let _metrics = init_metrics(&config)?;
            run_commands::handle_run(&config, events, cleanup).await
        },
        Commands::Subscriptions { cleanup } => {
            let config = load_config(explicit)?;
            run_commands::handle_subscriptions(&config, cleanup).await
        },
        Commands::ClearSuppression { group_id } => {
            let config = load_config(explicit)?;
            run_commands::handle_clear_suppression(&config, &group_id).await
        },
    }
}
