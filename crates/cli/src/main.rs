use std::{sync::Arc, time::Duration};

use {
    anyhow::Context as _,
    clap::Parser,
    relay_core::{PendingBinds, Relay},
    relay_store::{ChannelRetention, ConnectionStore, SqliteStore},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

/// Cadence of the pending-bind cache sweep.
const JANITOR_PERIOD: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "relay", about = "relay — bidirectional channel proxy bot")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Discord bot token.
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    token: String,

    /// Prefix marking a message as a command.
    #[arg(long, env = "COMMAND_PREFIX", default_value = "!")]
    prefix: String,

    /// Path to the SQLite database.
    #[arg(long, env = "RELAY_DATABASE_PATH", default_value = "relay.db")]
    database_path: String,

    /// Also delete channel rows (and their lock flags) when a connection
    /// is unbound. The default keeps them, preserving lock state across
    /// re-binds.
    #[arg(long, default_value_t = false)]
    drop_channels_on_unbind: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let retention = if cli.drop_channels_on_unbind {
        ChannelRetention::Delete
    } else {
        ChannelRetention::Keep
    };
    // Store bootstrap failure is fatal; everything after this is not.
    let store = SqliteStore::new(&cli.database_path, retention)
        .await
        .context("failed to initialize database")?;
    info!(path = %cli.database_path, "database ready");

    let pending = Arc::new(PendingBinds::new());
    let janitor = Arc::clone(&pending).spawn_janitor(JANITOR_PERIOD);

    let (_http, platform) = relay_discord::platform_for_token(&cli.token);
    let relay = Arc::new(Relay::new(
        Arc::new(store) as Arc<dyn ConnectionStore>,
        Arc::clone(&pending),
        Arc::new(platform),
        cli.prefix,
    ));

    let mut client = relay_discord::client(&cli.token, relay)
        .await
        .context("failed to build Discord client")?;

    tokio::select! {
        result = client.start() => result.context("gateway connection failed")?,
        () = shutdown_signal() => info!("shutdown signal received"),
    }
    janitor.abort();
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {},
                _ = term.recv() => {},
            }
        },
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
        },
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
