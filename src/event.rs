use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::bus::Envelope;
use crate::cache::{AssetRequest, AssetResponse};
use crate::error::NetworkError;
use crate::sync::SyncTrigger;

/// Events delivered to the background worker
#[derive(Debug)]
pub enum Event {
  /// Precache the current version's assets
  Install,
  /// Take control and evict other cache versions
  Activate,
  /// Intercepted request; the response goes back through `reply`
  Fetch {
    request: AssetRequest,
    reply: oneshot::Sender<Result<AssetResponse, NetworkError>>,
  },
  /// Server push with optional raw payload
  Push(Option<Vec<u8>>),
  /// Click on a shown notification, optionally on one of its actions
  NotificationClick { id: u64, action: Option<String> },
  /// Sync trigger from the host (periodic signal, explicit request)
  Sync(SyncTrigger),
  /// Connectivity restored
  Online,
  /// Message bus request from the foreground
  Message(Envelope),
}

/// Event source for the worker: an inbox plus an optional periodic sync tick
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a handler and the sender used to feed it.
  ///
  /// The tick task only holds a weak sender, so the handler closes once every
  /// returned sender is dropped.
  pub fn new(sync_interval: Option<Duration>) -> (Self, mpsc::UnboundedSender<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();

    if let Some(period) = sync_interval {
      let weak = tx.downgrade();
      tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // First tick completes immediately
        ticker.tick().await;
        loop {
          ticker.tick().await;
          let Some(tx) = weak.upgrade() else {
            break;
          };
          if tx.send(Event::Sync(SyncTrigger::Periodic)).is_err() {
            break;
          }
        }
      });
    }

    (Self { rx }, tx)
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
