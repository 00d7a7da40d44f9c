//! Practicum homework-status API over HTTPS.

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::StatusApi;
use crate::error::{PollError, RemoteFailure, SchemaError};

/// Keys the API puts into a 200 body instead of the expected schema.
const ERROR_KEYS: [&str; 2] = ["code", "error"];

pub struct PracticumApi {
    client: reqwest::Client,
    endpoint: String,
    auth_header: String,
}

impl PracticumApi {
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.to_string(),
            auth_header: format!("OAuth {}", token),
        }
    }

    fn transport(&self, from_date: i64, source: reqwest::Error) -> PollError {
        PollError::Transport {
            endpoint: self.endpoint.clone(),
            from_date,
            source: Box::new(source),
        }
    }

    fn remote(&self, from_date: i64, reason: RemoteFailure) -> PollError {
        PollError::RemoteService {
            endpoint: self.endpoint.clone(),
            from_date,
            reason,
        }
    }
}

#[async_trait]
impl StatusApi for PracticumApi {
    async fn fetch(&self, from_date: i64) -> Result<Value, PollError> {
        debug!(endpoint = %self.endpoint, from_date, "Requesting homework statuses");

        let resp = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, &self.auth_header)
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| self.transport(from_date, e))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(self.remote(from_date, RemoteFailure::Status(status.as_u16())));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| self.transport(from_date, e))?;
        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| SchemaError::MalformedBody(e.to_string()))?;

        if let Some(object) = parsed.as_object() {
            for key in ERROR_KEYS {
                if let Some(value) = object.get(key) {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    return Err(self.remote(
                        from_date,
                        RemoteFailure::Indicator { key: key.to_string(), value },
                    ));
                }
            }
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response and hand back the raw request text.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{}/api/user_api/homework_statuses/", addr), handle)
    }

    fn api(endpoint: &str) -> PracticumApi {
        PracticumApi::new(endpoint, "test-token", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_sends_auth_header_and_from_date() {
        let (endpoint, server) = serve_once("200 OK", r#"{"homeworks": [], "current_date": 42}"#).await;
        let body = api(&endpoint).fetch(1_700_000_000).await.unwrap();
        assert_eq!(body["current_date"], 42);

        let request = server.await.unwrap();
        let lower = request.to_lowercase();
        assert!(request.starts_with("GET /api/user_api/homework_statuses/?from_date=1700000000 "));
        assert!(lower.contains("authorization: oauth test-token"));
    }

    #[tokio::test]
    async fn test_non_ok_status_is_remote_error() {
        let (endpoint, _server) = serve_once("503 Service Unavailable", "{}").await;
        let err = api(&endpoint).fetch(10).await.unwrap_err();
        match err {
            PollError::RemoteService { endpoint: e, from_date, reason } => {
                assert_eq!(e, endpoint);
                assert_eq!(from_date, 10);
                assert_eq!(reason, RemoteFailure::Status(503));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_key_in_ok_body_is_remote_error() {
        let (endpoint, _server) =
            serve_once("200 OK", r#"{"code": "not_authenticated", "message": "no"}"#).await;
        let err = api(&endpoint).fetch(0).await.unwrap_err();
        match err {
            PollError::RemoteService { reason, .. } => assert_eq!(
                reason,
                RemoteFailure::Indicator {
                    key: "code".into(),
                    value: "not_authenticated".into()
                }
            ),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_object_in_ok_body_is_remote_error() {
        let (endpoint, _server) =
            serve_once("200 OK", r#"{"error": {"error": "Wrong from_date format"}}"#).await;
        let err = api(&endpoint).fetch(0).await.unwrap_err();
        match err {
            PollError::RemoteService { reason, .. } => assert_eq!(
                reason,
                RemoteFailure::Indicator {
                    key: "error".into(),
                    value: r#"{"error":"Wrong from_date format"}"#.into()
                }
            ),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_schema_error() {
        let (endpoint, _server) = serve_once("200 OK", "<html>oops</html>").await;
        let err = api(&endpoint).fetch(0).await.unwrap_err();
        assert!(matches!(err, PollError::Schema(SchemaError::MalformedBody(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = format!("http://{}/", addr);
        let err = api(&endpoint).fetch(5).await.unwrap_err();
        match err {
            PollError::Transport { endpoint: e, from_date, .. } => {
                assert_eq!(e, endpoint);
                assert_eq!(from_date, 5);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_token_not_in_error_text() {
        let (endpoint, _server) = serve_once("401 Unauthorized", "{}").await;
        let err = api(&endpoint).fetch(0).await.unwrap_err();
        assert!(!err.to_string().contains("test-token"));
    }
}
