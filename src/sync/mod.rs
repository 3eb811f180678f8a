//! Draining the pending-change queue against the backend.

mod client;
mod coordinator;

pub use client::{HttpSyncBackend, SyncBackend};
pub use coordinator::{SyncCoordinator, SyncOutcome, SyncStatus, SyncTrigger};
