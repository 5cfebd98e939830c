use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use tgnncp_core::{Message, MessageStatus, SuffixGenerator, destination_address, random_suffix};
use tgnncp_db::QueueDb;
use tgnncp_transport::Transport;

use crate::events::{RelayEvent, TickReport};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Destination node in the store-and-forward network.
    pub node: String,
    pub interval: Duration,
    pub suffix: SuffixGenerator,
}

impl RelayConfig {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            interval: DEFAULT_INTERVAL,
            suffix: random_suffix,
        }
    }
}

/// Periodically drains the queue into the transport.
///
/// Messages are attempted one at a time in id order, so at most one transport
/// process runs at once. Only one worker may run against a given database:
/// two workers would both pick up and deliver the same unsent rows.
pub struct RelayWorker {
    db: QueueDb,
    transport: Arc<dyn Transport>,
    config: RelayConfig,
    event_tx: mpsc::Sender<RelayEvent>,
    event_rx: Option<mpsc::Receiver<RelayEvent>>,
}

impl RelayWorker {
    pub fn new(db: QueueDb, transport: Arc<dyn Transport>, config: RelayConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1000);

        Self {
            db,
            transport,
            config,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<RelayEvent>> {
        self.event_rx.take()
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Ticks every `interval` until `shutdown` flips or its sender goes away.
    /// A tick in progress always finishes before the loop exits.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        // nobody is listening, let sends fail fast
        self.event_rx.take();

        let period = self.config.interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(node = %self.config.node, interval = ?period, "Relay loop started");

        while !*shutdown.borrow() {
            tokio::select! {
                _ = shutdown.changed() => {}
                _ = interval.tick() => {
                    self.run_tick().await;
                }
            }

            if shutdown.has_changed().is_err() {
                break;
            }
        }

        tracing::info!("Relay loop stopped");
        self.emit(RelayEvent::Stopped);
    }

    /// One pass over the queue. Returns `None` when the queue could not be read.
    pub async fn run_tick(&self) -> Option<TickReport> {
        let pending = match self.db.fetch_pending().await {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!(error = %e, "Error querying for unsent messages, skipping tick");
                self.emit(RelayEvent::TickSkipped { error: e.to_string() });
                return None;
            }
        };

        let mut report = TickReport::default();
        if pending.is_empty() {
            return Some(report);
        }

        let mut updates = Vec::with_capacity(pending.len());

        for message in &pending {
            tracing::info!(id = message.id, "Relaying message");

            let (status, destination) = self.relay_message(message).await;
            match status {
                MessageStatus::Sent => report.sent += 1,
                _ => report.failed += 1,
            }
            report.attempted += 1;
            updates.push((message.id, status));

            self.emit(RelayEvent::MessageRelayed {
                id: message.id,
                status,
                destination,
            });
        }

        report.applied = self.db.apply_status_updates(&updates).await;

        tracing::debug!(
            attempted = report.attempted,
            sent = report.sent,
            failed = report.failed,
            "Relay tick complete"
        );
        self.emit(RelayEvent::TickCompleted { report });

        Some(report)
    }

    async fn relay_message(&self, message: &Message) -> (MessageStatus, String) {
        let payload = message.payload_line();

        let suffix = match (self.config.suffix)() {
            Ok(suffix) => Some(suffix),
            Err(e) => {
                tracing::warn!(id = message.id, error = %e, "Sending without unique suffix");
                None
            }
        };

        let destination = destination_address(
            &self.config.node,
            message.chat_id,
            &message.timestamp,
            suffix.as_deref(),
        );
        tracing::debug!(id = message.id, destination = %destination, "Invoking transport");

        let status = match self.transport.deliver(payload.as_bytes(), &destination).await {
            Ok(()) => MessageStatus::Sent,
            Err(e) => {
                tracing::error!(id = message.id, error = %e, "Error occurred when running transport");
                if let Some(output) = e.output() {
                    tracing::debug!(id = message.id, output = %output.trim_end(), "Transport output");
                }
                MessageStatus::Failed
            }
        };

        (status, destination)
    }

    fn emit(&self, event: RelayEvent) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.event_tx.try_send(event) {
            tracing::trace!(?event, "Relay event dropped, receiver is behind");
        }
    }
}
