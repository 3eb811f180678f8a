//! Push payload parsing and the rendered notification model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_TITLE: &str = "Family Dashboard";
pub const DEFAULT_BODY: &str = "You have a new notification";
pub const DEFAULT_ICON: &str = "/icons/icon-192x192.png";
pub const DEFAULT_BADGE: &str = "/icons/badge-72x72.png";
pub const DEFAULT_URL: &str = "/";

/// A button rendered on the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
  pub action: String,
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub icon: Option<String>,
}

/// Data carried with a notification; `url` is where a click navigates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
  #[serde(default = "default_url")]
  pub url: String,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl Default for NotificationData {
  fn default() -> Self {
    Self {
      url: default_url(),
      extra: Map::new(),
    }
  }
}

fn default_url() -> String {
  DEFAULT_URL.to_string()
}

/// Push message as sent by the server. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PushPayload {
  pub title: Option<String>,
  pub body: Option<String>,
  pub icon: Option<String>,
  pub badge: Option<String>,
  pub data: Option<NotificationData>,
  pub actions: Option<Vec<NotificationAction>>,
  pub tag: Option<String>,
  pub renotify: Option<bool>,
}

impl PushPayload {
  /// Parse raw push bytes. JSON objects are read field by field; anything
  /// else that is valid text becomes the body.
  pub fn parse(raw: Option<&[u8]>) -> Self {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
      return Self::default();
    };

    if let Ok(payload) = serde_json::from_slice::<PushPayload>(raw) {
      return payload;
    }

    match std::str::from_utf8(raw) {
      Ok(text) if !text.trim().is_empty() => Self {
        body: Some(text.trim().to_string()),
        ..Self::default()
      },
      _ => Self::default(),
    }
  }
}

/// A notification ready to be shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
  pub title: String,
  pub body: String,
  pub icon: String,
  pub badge: String,
  /// Notifications sharing a tag replace each other
  pub tag: Option<String>,
  /// Alert again when replacing a tagged notification
  pub renotify: bool,
  pub data: NotificationData,
  pub actions: Vec<NotificationAction>,
}

impl From<PushPayload> for Notification {
  fn from(payload: PushPayload) -> Self {
    Self {
      title: payload.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
      body: payload.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
      icon: payload.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
      badge: payload.badge.unwrap_or_else(|| DEFAULT_BADGE.to_string()),
      tag: payload.tag,
      renotify: payload.renotify.unwrap_or(false),
      data: payload.data.unwrap_or_default(),
      actions: payload.actions.unwrap_or_default(),
    }
  }
}
