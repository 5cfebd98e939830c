mod config;

use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use tokio::sync::watch;

use tgnncp_telegram::{BotClient, Ingress};
use tgnncp_worker::{MessageStatus, NncpFile, QueueDb, RelayConfig, RelayEvent, RelayWorker};

use crate::config::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(&cli)?;

    let db = QueueDb::open(cli.db_path()?)
        .await
        .wrap_err("could not open sqlite db")?;

    if cli.init {
        tracing::info!("Initializing database");
        db.reset().await.wrap_err("could not initialize sqlite database")?;
        db.close().await;
        return Ok(());
    }

    let secret = cli.bot_secret()?;
    let node = cli.relay_node()?;
    let transport_config = cli.transport_config();

    if cli.dry_run {
        tracing::info!("Running in dry run mode, so not invoking nncp");
    }
    tracing::debug!(
        nncp_path = %transport_config.binary.display(),
        config_path = ?transport_config.cfg_path,
        destination_node = ?node,
        "Running with debug output"
    );

    let bot = BotClient::new(secret).wrap_err("could not create Telegram client")?;
    let me = bot.get_me().await.wrap_err("error connecting to bot api")?;
    tracing::info!("Authorized on account {}", me.username.unwrap_or_default());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let relay = node.map(|node| {
        let transport = Arc::new(NncpFile::new(transport_config));
        let mut worker = RelayWorker::new(db.clone(), transport, RelayConfig::new(node));

        if let Some(mut events) = worker.take_event_receiver() {
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    handle_event(event);
                }
            });
        }

        worker.spawn(shutdown_rx.clone())
    });

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutting down..."),
            Err(e) => tracing::error!(error = %e, "Could not listen for Ctrl-C, shutting down"),
        }
        let _ = shutdown_tx.send(true);
    });

    let ingress = Ingress::new(Arc::new(bot), db.clone(), cli.bot_debug);
    ingress.run(shutdown_rx).await;

    if let Some(relay) = relay {
        relay.await.wrap_err("relay loop panicked")?;
    }

    db.close().await;
    Ok(())
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let level = if cli.debug { "debug" } else { "info" };
    let telegram_level = if cli.bot_debug { "debug" } else { level };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .from_env_lossy()
                .add_directive(format!("tgnncp={}", level).parse()?)
                .add_directive(format!("tgnncp_worker={}", level).parse()?)
                .add_directive(format!("tgnncp_transport={}", level).parse()?)
                .add_directive(format!("tgnncp_db={}", level).parse()?)
                .add_directive(format!("tgnncp_telegram={}", telegram_level).parse()?),
        )
        .init();

    Ok(())
}

fn handle_event(event: RelayEvent) {
    match event {
        RelayEvent::MessageRelayed { id, status: MessageStatus::Sent, destination } => {
            tracing::info!(id, %destination, "Message sent");
        }
        RelayEvent::MessageRelayed { id, status, destination } => {
            tracing::warn!(id, ?status, %destination, "Message not delivered");
        }
        RelayEvent::TickCompleted { report } => {
            tracing::info!(
                sent = report.sent,
                failed = report.failed,
                "Relayed {} message(s)",
                report.attempted
            );
        }
        RelayEvent::TickSkipped { error } => {
            tracing::warn!(%error, "Relay tick skipped");
        }
        RelayEvent::Stopped => {
            tracing::debug!("Relay loop finished");
        }
    }
}
