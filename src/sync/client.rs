//! Delivery of pending changes to the backend.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{Error, NetworkError};
use crate::queue::PendingChange;

/// Sends one pending change to the server.
///
/// `Ok` means the server accepted it (any 2xx). Rejections, timeouts and
/// transport failures are all `Err`.
#[async_trait]
pub trait SyncBackend: Send + Sync {
  async fn push(&self, change: &PendingChange) -> Result<(), NetworkError>;
}

/// POSTs each change as JSON to a single sync endpoint.
#[derive(Clone)]
pub struct HttpSyncBackend {
  client: reqwest::Client,
  endpoint: Url,
}

impl HttpSyncBackend {
  pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, Error> {
    let endpoint = Url::parse(endpoint)
      .map_err(|e| Error::Lifecycle(format!("invalid sync endpoint '{}': {}", endpoint, e)))?;
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(NetworkError::from)?;

    Ok(Self { client, endpoint })
  }
}

#[async_trait]
impl SyncBackend for HttpSyncBackend {
  async fn push(&self, change: &PendingChange) -> Result<(), NetworkError> {
    let response = self
      .client
      .post(self.endpoint.clone())
      .json(change)
      .send()
      .await?;

    let status = response.status();
    debug!(id = change.id, status = status.as_u16(), "Sync endpoint responded");

    if status.is_success() {
      Ok(())
    } else {
      Err(NetworkError::Status(status.as_u16()))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::queue::Operation;
  use chrono::Utc;
  use serde_json::json;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::{TcpListener, TcpStream};
  use tokio::sync::oneshot;

  fn change() -> PendingChange {
    PendingChange {
      id: 7,
      operation: Operation::Update,
      payload: json!({"name": "Milk", "purchased": true}),
      enqueued_at: Utc::now(),
    }
  }

  /// Read one request: headers plus a `content-length` body.
  async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
      let n = stream.read(&mut chunk).await.unwrap();
      if n == 0 {
        break;
      }
      buf.extend_from_slice(&chunk[..n]);

      let text = String::from_utf8_lossy(&buf).to_string();
      if let Some(end) = text.find("\r\n\r\n") {
        let length = text[..end]
          .lines()
          .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name
              .eq_ignore_ascii_case("content-length")
              .then(|| value.trim().parse::<usize>().ok())
              .flatten()
          })
          .unwrap_or(0);
        if buf.len() >= end + 4 + length {
          return text;
        }
      }
    }
    String::from_utf8_lossy(&buf).to_string()
  }

  /// Answer a single request with `status_line`, handing back what was sent.
  async fn respond_once(status_line: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
      let (mut stream, _) = listener.accept().await.unwrap();
      let request = read_request(&mut stream).await;
      let response = format!(
        "HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        status_line
      );
      stream.write_all(response.as_bytes()).await.unwrap();
      stream.shutdown().await.unwrap();
      let _ = tx.send(request);
    });

    (format!("http://{}/api/sync", addr), rx)
  }

  #[tokio::test]
  async fn test_created_counts_as_accepted() {
    let (endpoint, request) = respond_once("201 Created").await;
    let backend = HttpSyncBackend::new(&endpoint, Duration::from_secs(5)).unwrap();

    backend.push(&change()).await.unwrap();

    let request = request.await.unwrap();
    assert!(request.starts_with("POST /api/sync HTTP/1.1"));
    let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
    let sent: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(sent["id"], json!(7));
    assert_eq!(sent["operation"], json!("update"));
    assert!(sent.get("enqueuedAt").is_some());
  }

  #[tokio::test]
  async fn test_conflict_is_a_status_failure() {
    let (endpoint, _request) = respond_once("409 Conflict").await;
    let backend = HttpSyncBackend::new(&endpoint, Duration::from_secs(5)).unwrap();

    let err = backend.push(&change()).await.unwrap_err();
    assert_eq!(err, NetworkError::Status(409));
  }

  #[tokio::test]
  async fn test_stalled_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/api/sync", listener.local_addr().unwrap());
    tokio::spawn(async move {
      let (mut stream, _) = listener.accept().await.unwrap();
      read_request(&mut stream).await;
      // Never answer
      tokio::time::sleep(Duration::from_secs(30)).await;
      drop(stream);
    });

    let backend = HttpSyncBackend::new(&endpoint, Duration::from_millis(200)).unwrap();
    let err = backend.push(&change()).await.unwrap_err();
    assert_eq!(err, NetworkError::Timeout);
  }

  #[test]
  fn test_invalid_endpoint_is_a_configuration_error() {
    let err = HttpSyncBackend::new("not a url", Duration::from_secs(1))
      .err()
      .unwrap();
    assert!(matches!(err, Error::Lifecycle(_)));
  }
}
