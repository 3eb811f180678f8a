//! Request/reply messages between the foreground app and the worker.
//!
//! Every request except `SKIP_WAITING` carries a reply channel and receives
//! exactly one `Reply`. Requests travel as raw JSON so the worker can answer
//! malformed ones with a protocol error instead of dropping them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::event::Event;
use crate::queue::Operation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
  /// Upsert one record (object) or several (array) into a collection
  SaveOffline { collection: String, data: Value },
  GetOffline { collection: String },
  /// Schedule a sync on the next trigger; never syncs inline
  RequestSync,
  /// Activate a waiting cache version. No reply.
  SkipWaiting,
  QueueChange { operation: Operation, payload: Value },
  DeleteOffline { collection: String, key: Value },
  ClearOffline { collection: String },
  GetSyncStatus,
}

impl Message {
  pub fn expects_reply(&self) -> bool {
    !matches!(self, Message::SkipWaiting)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
  pub success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl Reply {
  pub fn ok(data: Option<Value>) -> Self {
    Self {
      success: true,
      data,
      error: None,
    }
  }

  pub fn err(error: impl Display) -> Self {
    Self {
      success: false,
      data: None,
      error: Some(error.to_string()),
    }
  }
}

/// A request in flight to the worker.
#[derive(Debug)]
pub struct Envelope {
  pub body: Value,
  pub reply: Option<oneshot::Sender<Reply>>,
}

impl Envelope {
  pub fn parse(&self) -> Result<Message> {
    serde_json::from_value(self.body.clone())
      .map_err(|e| Error::Protocol(format!("malformed message: {}", e)))
  }

  /// Answer the request. A requester that went away is not an error.
  pub fn respond(self, reply: Reply) {
    if let Some(tx) = self.reply {
      let _ = tx.send(reply);
    }
  }
}

/// Foreground side of the bus.
#[derive(Clone)]
pub struct BusClient {
  tx: mpsc::UnboundedSender<Event>,
}

impl BusClient {
  pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
    Self { tx }
  }

  pub async fn request(&self, message: &Message) -> Result<Reply> {
    self.request_raw(serde_json::to_value(message)?).await
  }

  /// Send arbitrary JSON and wait for the reply.
  pub async fn request_raw(&self, body: Value) -> Result<Reply> {
    let (tx, rx) = oneshot::channel();
    self
      .tx
      .send(Event::Message(Envelope {
        body,
        reply: Some(tx),
      }))
      .map_err(|_| Error::Protocol("worker is not running".to_string()))?;

    rx.await
      .map_err(|_| Error::Protocol("worker dropped the request without replying".to_string()))
  }

  /// Fire-and-forget, for messages that have no reply.
  pub fn post(&self, message: &Message) -> Result<()> {
    self
      .tx
      .send(Event::Message(Envelope {
        body: serde_json::to_value(message)?,
        reply: None,
      }))
      .map_err(|_| Error::Protocol("worker is not running".to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_wire_names() {
    let msg: Message = serde_json::from_value(json!({
      "kind": "SAVE_OFFLINE",
      "collection": "shopping_list",
      "data": {"id": 1}
    }))
    .unwrap();
    assert_eq!(
      msg,
      Message::SaveOffline {
        collection: "shopping_list".to_string(),
        data: json!({"id": 1}),
      }
    );

    assert_eq!(
      serde_json::to_value(Message::RequestSync).unwrap(),
      json!({"kind": "REQUEST_SYNC"})
    );
    assert!(!Message::SkipWaiting.expects_reply());
  }

  #[test]
  fn test_malformed_body_is_protocol_error() {
    let envelope = Envelope {
      body: json!({"kind": "GET_OFFLINE"}),
      reply: None,
    };
    assert!(matches!(envelope.parse(), Err(Error::Protocol(_))));

    let envelope = Envelope {
      body: json!({"kind": "SELF_DESTRUCT"}),
      reply: None,
    };
    assert!(matches!(envelope.parse(), Err(Error::Protocol(_))));
  }

  #[test]
  fn test_reply_shape() {
    assert_eq!(
      serde_json::to_value(Reply::ok(Some(json!([])))).unwrap(),
      json!({"success": true, "data": []})
    );
    assert_eq!(
      serde_json::to_value(Reply::err("storage quota exceeded")).unwrap(),
      json!({"success": false, "error": "storage quota exceeded"})
    );
  }

  #[tokio::test]
  async fn test_request_fails_when_worker_gone() {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);
    let client = BusClient::new(tx);

    let err = client.request(&Message::GetSyncStatus).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
  }
}
