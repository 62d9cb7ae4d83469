//! Status Reconciliation Loop
//!
//! A recurring background task that polls the Intents Provider for every
//! in-flight intent and folds the remote status into local state. The loop
//! is the retry mechanism for status visibility: each tick is an implicit
//! retry of the previous failed poll.
//!
//! The single-pass logic lives in [`StatusPoller::poll_once`] so tests can
//! drive it directly without the timer.

use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clients::IntentsClient;
use crate::error::GatewayError;
use crate::store::{IntentStore, PaymentIntent, PaymentIntentStatus};

// ============================================================================
// REMOTE STATUS MAPPING
// ============================================================================

/// Maps the Intents Provider status vocabulary to the local status enum.
///
/// Matching is case-insensitive; unknown remote statuses conservatively map
/// to AWAITING_DEPOSIT.
pub fn map_remote_status(remote: &str) -> PaymentIntentStatus {
    match remote.to_uppercase().as_str() {
        "PENDING_DEPOSIT" => PaymentIntentStatus::AwaitingDeposit,
        "PROCESSING" => PaymentIntentStatus::Swapping,
        "SUCCESS" => PaymentIntentStatus::Completed,
        "FAILED" | "INCOMPLETE_DEPOSIT" => PaymentIntentStatus::Failed,
        _ => PaymentIntentStatus::AwaitingDeposit,
    }
}

// ============================================================================
// POLLER
// ============================================================================

/// Handle to a spawned reconciliation loop.
///
/// Dropping the handle does not stop the loop; call [`PollerHandle::stop`]
/// on shutdown so no further ticks are scheduled.
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PollerHandle {
    /// Signals the loop to stop and waits for the task to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

/// Status reconciliation poller.
///
/// Owns a store handle and an intents client; both are dependency-injected
/// so a single pass is testable against HTTP doubles.
#[derive(Clone)]
pub struct StatusPoller {
    store: IntentStore,
    intents: IntentsClient,
    poll_interval: Duration,
}

impl StatusPoller {
    /// Creates a new poller.
    pub fn new(store: IntentStore, intents: IntentsClient, poll_interval_ms: u64) -> Self {
        Self {
            store,
            intents,
            poll_interval: Duration::from_millis(poll_interval_ms),
        }
    }

    /// Spawns the recurring reconciliation task.
    ///
    /// The first pass runs immediately; subsequent passes run every
    /// configured interval until the returned handle is stopped.
    pub fn spawn(self) -> PollerHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            info!(
                "Starting status reconciliation loop, interval {:?}",
                self.poll_interval
            );
            loop {
                if let Err(e) = self.poll_once().await {
                    error!("Status reconciliation pass aborted: {}", e);
                }

                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = shutdown_rx.changed() => {
                        info!("Stopping status reconciliation loop");
                        break;
                    }
                }
            }
        });
        PollerHandle { shutdown, handle }
    }

    /// Runs a single reconciliation pass.
    ///
    /// Intents are reconciled concurrently; a failure on one intent is
    /// logged and does not abort the rest of the batch. A failure of the
    /// initial listing query aborts the whole pass.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of intents whose status was updated
    /// * `Err(GatewayError)` - The listing query failed
    pub async fn poll_once(&self) -> Result<usize, GatewayError> {
        let intents = self.store.list_reconcilable().await?;
        debug!("Reconciling {} payment intents", intents.len());

        let results = join_all(
            intents
                .iter()
                .map(|intent| self.reconcile_intent(intent)),
        )
        .await;

        let mut updated = 0;
        for (intent, result) in intents.iter().zip(results) {
            match result {
                Ok(true) => updated += 1,
                Ok(false) => {}
                Err(e) => {
                    error!(
                        "Failed to reconcile status for payment intent {}: {}",
                        intent.id, e
                    );
                }
            }
        }
        Ok(updated)
    }

    /// Reconciles a single intent against the provider's status lookup.
    ///
    /// Writes back only when the mapped status differs from the stored one,
    /// and only if the stored status is still the one observed at poll time.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Status changed and the write was applied
    /// * `Ok(false)` - Nothing to do (same status, or a concurrent update won)
    async fn reconcile_intent(&self, intent: &PaymentIntent) -> Result<bool, GatewayError> {
        let deposit_address = match &intent.intents_deposit_address {
            Some(address) => address,
            None => return Ok(false),
        };

        let remote = self.intents.deposit_status(deposit_address).await?;
        let mapped = map_remote_status(&remote.status);

        if mapped == intent.status {
            return Ok(false);
        }

        let observed_status = intent.status;
        let applied = self
            .store
            .update_intent_if_status(&intent.id, observed_status, |record| {
                record.status = mapped;
                record.intents_status = Some(remote.status.clone());
                if let Some(tx_hash) = &remote.tx_hash {
                    merge_tx_hash(record, tx_hash);
                }
            })
            .await?;

        match applied {
            Some(updated) => {
                info!(
                    "Updated payment intent {} from {} to {}",
                    updated.id, observed_status, mapped
                );
                Ok(true)
            }
            None => {
                warn!(
                    "Skipping stale reconciliation write for payment intent {}: status changed concurrently",
                    intent.id
                );
                Ok(false)
            }
        }
    }
}

/// Merges the settlement transaction hash into the intent's provider
/// metadata, preserving previously stored keys.
fn merge_tx_hash(record: &mut PaymentIntent, tx_hash: &str) {
    let mut metadata = record
        .provider_metadata
        .take()
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
    if let serde_json::Value::Object(map) = &mut metadata {
        map.insert(
            "txHash".to_string(),
            serde_json::Value::String(tx_hash.to_string()),
        );
    }
    record.provider_metadata = Some(metadata);
}
