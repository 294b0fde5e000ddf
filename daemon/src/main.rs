//! relaymesh daemon — entry point for running the consumer.

mod identity;

use clap::Parser;
use relaymesh_dispatch::{
    ConsumerConfig, ConsumerContext, DispatchConfig, Dispatcher, HttpRelayTransport,
    ShutdownController, TxQueueSubmitter, UpdateRegistrar,
};
use relaymesh_finalization::TrackerConfig;
use relaymesh_session::HealthConfig;
use relaymesh_types::Endpoint;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "relaymesh-daemon", about = "relaymesh consumer daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Provider responses required per request.
    #[arg(long, env = "RELAYMESH_REQUIRED_RESPONSES")]
    required_responses: Option<usize>,

    /// Per-provider call timeout in milliseconds.
    #[arg(long, env = "RELAYMESH_CALL_TIMEOUT_MS")]
    call_timeout_ms: Option<u64>,

    /// Overall request deadline in milliseconds.
    #[arg(long, env = "RELAYMESH_REQUEST_DEADLINE_MS")]
    request_deadline_ms: Option<u64>,

    /// Path to a 32-byte hex-encoded signing seed.
    #[arg(long, env = "RELAYMESH_KEY_FILE")]
    key_file: Option<PathBuf>,

    /// Allow running with a freshly generated throwaway identity (dev only).
    #[arg(long, env = "RELAYMESH_ALLOW_EPHEMERAL_KEY")]
    allow_ephemeral_key: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "RELAYMESH_LOG_LEVEL")]
    log_level: String,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the consumer.
    #[command(name = "consumer")]
    Consumer {
        #[command(subcommand)]
        action: ConsumerAction,
    },
}

#[derive(clap::Subcommand)]
enum ConsumerAction {
    /// Run the consumer.
    Run,
}

fn merge_config(cli: &Cli) -> ConsumerConfig {
    let file_config: Option<ConsumerConfig> = if let Some(ref config_path) = cli.config {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str::<ConsumerConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("Loaded config from {}", config_path.display());
                    Some(cfg)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {e}, using CLI defaults");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {e}, using CLI defaults",
                    config_path.display()
                );
                None
            }
        }
    } else {
        None
    };

    let base = file_config.unwrap_or_default();
    ConsumerConfig {
        required_responses: cli.required_responses.unwrap_or(base.required_responses),
        call_timeout_ms: cli.call_timeout_ms.unwrap_or(base.call_timeout_ms),
        request_deadline_ms: cli.request_deadline_ms.unwrap_or(base.request_deadline_ms),
        key_file: cli.key_file.clone().or(base.key_file),
        allow_ephemeral_key: cli.allow_ephemeral_key || base.allow_ephemeral_key,
        log_level: cli.log_level.clone(),
        ..base
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    relaymesh_utils::init_tracing();

    let cli = Cli::parse();
    let config = merge_config(&cli);

    match cli.command {
        Command::Consumer { action } => match action {
            ConsumerAction::Run => run_consumer(config).await?,
        },
    }

    Ok(())
}

async fn run_consumer(config: ConsumerConfig) -> anyhow::Result<()> {
    // A consumer without a signing identity cannot file conflict reports;
    // refuse to start rather than run degraded.
    let keypair = identity::load_identity(&config)?;
    tracing::info!(
        pubkey = %hex::encode(keypair.public.as_bytes()),
        "consumer identity loaded"
    );

    let context = Arc::new(ConsumerContext::new(
        HealthConfig {
            half_life_secs: config.health_half_life_secs,
        },
        TrackerConfig {
            recency_window_secs: config.recency_window_secs,
            lag_escalation: config.lag_escalation,
        },
    ));

    if config.endpoints.is_empty() {
        tracing::warn!("no endpoints configured; the consumer will serve nothing");
    }
    for endpoint_config in &config.endpoints {
        let endpoint = Endpoint::new(
            endpoint_config.chain_id.clone(),
            endpoint_config.api_interface,
        );
        context.register_endpoint(endpoint);
    }

    // The chain-state synchronization layer drives this registrar with
    // pairing updates; it is handed out, not polled.
    let registrar = Arc::new(UpdateRegistrar::new(Arc::clone(&context)));

    let (submitter, mut report_rx) = TxQueueSubmitter::new(config.report_queue_capacity);
    let transport = HttpRelayTransport::new(Duration::from_millis(config.call_timeout_ms))
        .map_err(|e| anyhow::anyhow!("building relay transport: {e}"))?;
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&context),
        Arc::new(transport),
        Arc::new(submitter),
        DispatchConfig {
            required_responses: config.required_responses,
            call_timeout: Duration::from_millis(config.call_timeout_ms),
            request_deadline: Duration::from_millis(config.request_deadline_ms),
        },
    ));

    let shutdown = ShutdownController::new();

    // Drain queued conflict reports toward the transaction-submission layer.
    let mut drain_shutdown = shutdown.subscribe();
    let report_drain = tokio::spawn(async move {
        loop {
            tokio::select! {
                report = report_rx.recv() => match report {
                    Some(bytes) => {
                        tracing::info!(size = bytes.len(), "conflict report handed to tx layer");
                    }
                    None => break,
                },
                _ = drain_shutdown.recv() => break,
            }
        }
    });

    // Periodic stats heartbeat.
    let stats_dispatcher = Arc::clone(&dispatcher);
    let mut stats_shutdown = shutdown.subscribe();
    let stats_loop = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let snapshot = stats_dispatcher.stats().snapshot();
                    tracing::info!(?snapshot, "dispatch statistics");
                }
                _ = stats_shutdown.recv() => break,
            }
        }
    });

    tracing::info!(
        endpoints = context.registered_endpoints().len(),
        required_responses = config.required_responses,
        "relaymesh consumer started"
    );
    let _registrar = registrar;

    shutdown.wait_for_signal().await;
    tracing::info!("Shutdown signal received — stopping consumer");

    let _ = tokio::join!(report_drain, stats_loop);
    tracing::info!("relaymesh daemon exited cleanly");
    Ok(())
}
