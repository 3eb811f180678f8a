//! Push-originated and locally generated notifications.

mod dispatcher;
mod payload;
mod surface;

pub use dispatcher::{ClickOutcome, NotificationDispatcher, DISMISS_ACTION, SYNC_COMPLETE_TAG};
pub use payload::{Notification, NotificationAction, NotificationData, PushPayload};
pub use surface::{
  NotificationCenter, NotificationSurface, ShownNotification, Window, WindowHost, WindowId,
  WindowRegistry,
};
