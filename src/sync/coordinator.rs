//! Sync cycles: ordered delivery with halt-on-first-failure.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use super::client::SyncBackend;
use crate::error::{NetworkError, StorageError};
use crate::notify::NotificationDispatcher;
use crate::queue::PendingQueue;

/// What started a sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
  /// Connectivity came back
  Reconnect,
  /// Periodic background signal
  Periodic,
  /// Scheduled through the message bus
  Requested,
  /// Run directly (CLI, tests)
  Manual,
}

/// Result of one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
  /// The snapshot was fully delivered
  Completed { applied: usize },
  /// A change failed; it and everything after it stay queued
  Halted {
    applied: usize,
    failed_id: i64,
    error: NetworkError,
  },
  /// A cycle was already running; this trigger did nothing
  Coalesced,
}

impl SyncOutcome {
  pub fn applied(&self) -> usize {
    match self {
      SyncOutcome::Completed { applied } | SyncOutcome::Halted { applied, .. } => *applied,
      SyncOutcome::Coalesced => 0,
    }
  }
}

/// Snapshot for the "N changes awaiting sync" indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
  pub pending: usize,
  pub syncing: bool,
  /// A sync was requested and has not started yet
  pub requested: bool,
}

/// Drives the pending-change queue toward empty.
///
/// At most one cycle runs at a time; triggers arriving meanwhile are
/// coalesced into the running cycle. There is no retry inside a cycle: the
/// next external trigger picks up whatever is left.
pub struct SyncCoordinator {
  queue: PendingQueue,
  backend: Arc<dyn SyncBackend>,
  notifications: Arc<NotificationDispatcher>,
  syncing: AtomicBool,
  requested: AtomicBool,
  wake: Notify,
}

/// Clears the syncing flag however the cycle ends.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

impl SyncCoordinator {
  pub fn new(
    queue: PendingQueue,
    backend: Arc<dyn SyncBackend>,
    notifications: Arc<NotificationDispatcher>,
  ) -> Self {
    Self {
      queue,
      backend,
      notifications,
      syncing: AtomicBool::new(false),
      requested: AtomicBool::new(false),
      wake: Notify::new(),
    }
  }

  pub fn is_syncing(&self) -> bool {
    self.syncing.load(Ordering::Acquire)
  }

  pub fn status(&self) -> Result<SyncStatus, StorageError> {
    Ok(SyncStatus {
      pending: self.queue.len()?,
      syncing: self.is_syncing(),
      requested: self.requested.load(Ordering::Acquire),
    })
  }

  /// Record interest in a sync without running one.
  pub fn request_sync(&self) {
    self.requested.store(true, Ordering::Release);
    self.wake.notify_one();
  }

  /// Resolves once a sync has been requested since the last wait.
  pub async fn scheduled(&self) {
    self.wake.notified().await;
  }

  /// Run one cycle unless one is already in flight.
  pub async fn trigger(&self, trigger: SyncTrigger) -> Result<SyncOutcome, StorageError> {
    if self
      .syncing
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      debug!(?trigger, "Sync cycle already running, coalescing trigger");
      return Ok(SyncOutcome::Coalesced);
    }
    let _guard = CycleGuard(&self.syncing);
    self.requested.store(false, Ordering::Release);

    let outcome = self.run_cycle().await?;
    let remaining = self.queue.len()?;

    match &outcome {
      SyncOutcome::Halted {
        applied,
        failed_id,
        error,
      } => warn!(
        ?trigger,
        applied,
        failed_id,
        remaining,
        error = %error,
        "Sync cycle halted"
      ),
      _ => info!(?trigger, applied = outcome.applied(), remaining, "Sync cycle finished"),
    }

    self.notifications.sync_complete(outcome.applied());
    Ok(outcome)
  }

  async fn run_cycle(&self) -> Result<SyncOutcome, StorageError> {
    let snapshot = self.queue.dequeue_batch()?;
    let mut applied = 0;

    for change in &snapshot {
      if let Err(error) = self.backend.push(change).await {
        return Ok(SyncOutcome::Halted {
          applied,
          failed_id: change.id,
          error,
        });
      }

      // The server already has it; if this fails the change is resent later
      self.queue.ack(change.id)?;
      applied += 1;
    }

    Ok(SyncOutcome::Completed { applied })
  }
}
