//! Rendering push and sync notifications, and routing clicks.

use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use super::payload::{Notification, NotificationData, PushPayload, DEFAULT_BADGE, DEFAULT_ICON};
use super::surface::{NotificationSurface, ShownNotification, WindowHost, WindowId};

/// Tag shared by every sync summary, so a newer one replaces the older.
pub const SYNC_COMPLETE_TAG: &str = "sync-complete";

/// Action id that closes a notification without navigating.
pub const DISMISS_ACTION: &str = "dismiss";

/// What a notification click resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
  /// An open window already showed the target and was focused
  Focused(WindowId),
  /// A new window was opened at the target
  Opened(WindowId),
  /// The dismiss action was chosen
  Dismissed,
  /// The host refused to open a window
  Blocked,
  /// No such notification is visible
  Unknown,
}

pub struct NotificationDispatcher {
  surface: Arc<dyn NotificationSurface>,
  windows: Arc<dyn WindowHost>,
  origin: Url,
}

impl NotificationDispatcher {
  pub fn new(surface: Arc<dyn NotificationSurface>, windows: Arc<dyn WindowHost>, origin: Url) -> Self {
    Self {
      surface,
      windows,
      origin,
    }
  }

  /// Render a server push. Missing fields fall back to defaults.
  pub fn on_push(&self, raw: Option<&[u8]>) -> u64 {
    let notification = Notification::from(PushPayload::parse(raw));
    self.surface.show(notification)
  }

  /// Summarize a finished sync cycle. Nothing is shown when nothing applied.
  pub fn sync_complete(&self, applied: usize) -> Option<u64> {
    if applied == 0 {
      return None;
    }

    let body = if applied == 1 {
      "1 change applied".to_string()
    } else {
      format!("{} changes applied", applied)
    };

    Some(self.surface.show(Notification {
      title: "Sync complete".to_string(),
      body,
      icon: DEFAULT_ICON.to_string(),
      badge: DEFAULT_BADGE.to_string(),
      tag: Some(SYNC_COMPLETE_TAG.to_string()),
      renotify: false,
      data: NotificationData::default(),
      actions: Vec::new(),
    }))
  }

  /// Close the notification and bring its target URL to the front, reusing
  /// an open window when one already shows it.
  pub async fn on_click(&self, id: u64, action: Option<&str>) -> ClickOutcome {
    let Some(shown) = self.surface.close(id) else {
      debug!(id, "Click on a notification that is no longer visible");
      return ClickOutcome::Unknown;
    };

    if action == Some(DISMISS_ACTION) {
      return ClickOutcome::Dismissed;
    }

    let target = match self.origin.join(&shown.notification.data.url) {
      Ok(url) => url,
      Err(e) => {
        warn!(url = %shown.notification.data.url, error = %e, "Bad notification URL, using origin");
        self.origin.clone()
      }
    };

    for window in self.windows.windows().await {
      if window.url == target && self.windows.focus(window.id).await {
        return ClickOutcome::Focused(window.id);
      }
    }

    match self.windows.open(target).await {
      Some(id) => ClickOutcome::Opened(id),
      None => ClickOutcome::Blocked,
    }
  }

  pub fn visible(&self) -> Vec<ShownNotification> {
    self.surface.visible()
  }
}
