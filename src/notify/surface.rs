//! Where notifications are shown and where clicks navigate to.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::info;
use url::Url;

use super::payload::Notification;

/// A notification currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ShownNotification {
  pub id: u64,
  pub notification: Notification,
}

/// Displays notifications.
pub trait NotificationSurface: Send + Sync {
  /// Show a notification; a visible one with the same tag is replaced.
  fn show(&self, notification: Notification) -> u64;

  fn close(&self, id: u64) -> Option<ShownNotification>;

  fn visible(&self) -> Vec<ShownNotification>;
}

pub type WindowId = u64;

/// An application window known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
  pub id: WindowId,
  pub url: Url,
  pub focused: bool,
}

/// Enumerates, focuses, and opens application windows.
#[async_trait]
pub trait WindowHost: Send + Sync {
  async fn windows(&self) -> Vec<Window>;

  /// Returns false if the window is gone.
  async fn focus(&self, id: WindowId) -> bool;

  /// Returns None if the host refused to open a window.
  async fn open(&self, url: Url) -> Option<WindowId>;
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
  m.lock().unwrap_or_else(|e| e.into_inner())
}

/// In-process notification tray.
#[derive(Default)]
pub struct NotificationCenter {
  shown: Mutex<Vec<ShownNotification>>,
  next_id: AtomicU64,
}

impl NotificationCenter {
  pub fn new() -> Self {
    Self::default()
  }
}

impl NotificationSurface for NotificationCenter {
  fn show(&self, notification: Notification) -> u64 {
    let mut shown = lock(&self.shown);

    let same_tag = notification.tag.as_ref().and_then(|tag| {
      shown
        .iter()
        .position(|s| s.notification.tag.as_ref() == Some(tag))
    });

    if let Some(pos) = same_tag {
      let existing = &mut shown[pos];
      info!(
        id = existing.id,
        tag = ?notification.tag,
        renotify = notification.renotify,
        title = %notification.title,
        "Replacing notification"
      );
      existing.notification = notification;
      return existing.id;
    }

    let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
    info!(id, title = %notification.title, body = %notification.body, "Showing notification");
    shown.push(ShownNotification { id, notification });
    id
  }

  fn close(&self, id: u64) -> Option<ShownNotification> {
    let mut shown = lock(&self.shown);
    let pos = shown.iter().position(|s| s.id == id)?;
    Some(shown.remove(pos))
  }

  fn visible(&self) -> Vec<ShownNotification> {
    lock(&self.shown).clone()
  }
}

/// In-process window list.
#[derive(Default)]
pub struct WindowRegistry {
  windows: Mutex<Vec<Window>>,
  next_id: AtomicU64,
}

impl WindowRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a window that is already open.
  pub fn attach(&self, url: Url) -> WindowId {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
    lock(&self.windows).push(Window {
      id,
      url,
      focused: false,
    });
    id
  }
}

#[async_trait]
impl WindowHost for WindowRegistry {
  async fn windows(&self) -> Vec<Window> {
    lock(&self.windows).clone()
  }

  async fn focus(&self, id: WindowId) -> bool {
    let mut windows = lock(&self.windows);
    if !windows.iter().any(|w| w.id == id) {
      return false;
    }
    for window in windows.iter_mut() {
      window.focused = window.id == id;
    }
    true
  }

  async fn open(&self, url: Url) -> Option<WindowId> {
    let id = self.attach(url);
    self.focus(id).await;
    Some(id)
  }
}
