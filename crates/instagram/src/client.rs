//! Instagram Graph API client for sending direct messages

use async_trait::async_trait;
use common::Config;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fixed timeout for every Graph API call
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Delivers reply text back to an Instagram user
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// `Ok(None)` means the message was not delivered but nothing went wrong
    /// at the transport level (not configured, or rejected by the provider).
    async fn send(&self, recipient_id: &str, text: &str) -> common::Result<Option<Value>>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    recipient: Recipient<'a>,
    message: MessageText<'a>,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct MessageText<'a> {
    text: &'a str,
}

/// Graph API client
pub struct GraphClient {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
    ig_user_id: Option<String>,
}

impl GraphClient {
    pub fn new(
        base_url: impl Into<String>,
        access_token: Option<String>,
        ig_user_id: Option<String>,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            access_token,
            ig_user_id,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(
            config.graph_api_base_url.clone(),
            config.page_access_token.clone(),
            config.ig_user_id.clone(),
        )
    }

    fn headers(&self, token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            headers.insert(AUTHORIZATION, val);
        }
        headers
    }

    /// Send a text message to an Instagram user
    ///
    /// Returns the provider's JSON response on success, `None` when the
    /// client is not configured or the provider rejects the request.
    pub async fn send_message(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<Option<Value>, ClientError> {
        let (token, account_id) = match (&self.access_token, &self.ig_user_id) {
            (Some(token), Some(account_id)) => (token, account_id),
            _ => {
                warn!("Missing META_PAGE_ACCESS_TOKEN or IG_USER_ID, not sending message");
                return Ok(None);
            }
        };

        let url = format!("{}/{}/messages", self.base_url, account_id);
        let request = SendMessageRequest {
            recipient: Recipient { id: recipient_id },
            message: MessageText { text },
        };

        debug!(recipient = recipient_id, "POST {}", url);
        let resp = self
            .client
            .post(&url)
            .headers(self.headers(token))
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                recipient = recipient_id,
                "Send message error: {}",
                body
            );
            return Ok(None);
        }

        let body: Value = resp.json().await?;
        info!(recipient = recipient_id, "Message sent");
        Ok(Some(body))
    }
}

#[async_trait]
impl MessageSender for GraphClient {
    async fn send(&self, recipient_id: &str, text: &str) -> common::Result<Option<Value>> {
        self.send_message(recipient_id, text)
            .await
            .map_err(|e| common::Error::Messaging(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct Received {
        account: String,
        authorization: Option<String>,
        body: Value,
    }

    #[derive(Clone)]
    struct Stub {
        status: StatusCode,
        response: Value,
        received: Arc<Mutex<Vec<Received>>>,
    }

    async fn messages(
        State(stub): State<Stub>,
        Path(account): Path<String>,
        headers: axum::http::HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        stub.received.lock().unwrap().push(Received {
            account,
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });
        (stub.status, Json(stub.response.clone()))
    }

    async fn spawn_graph(status: StatusCode, response: Value) -> (String, Arc<Mutex<Vec<Received>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let stub = Stub {
            status,
            response,
            received: received.clone(),
        };
        let app = Router::new()
            .route("/:account/messages", post(messages))
            .with_state(stub);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), received)
    }

    #[tokio::test]
    async fn test_send_message_success() {
        let (base_url, received) = spawn_graph(
            StatusCode::OK,
            json!({ "recipient_id": "U1", "message_id": "mid.1" }),
        )
        .await;
        let client = GraphClient::new(base_url, Some("page-token".into()), Some("1784".into())).unwrap();

        let result = client.send_message("U1", "Hello!").await.unwrap();
        assert_eq!(result.unwrap()["message_id"], "mid.1");

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].account, "1784");
        assert_eq!(received[0].authorization.as_deref(), Some("Bearer page-token"));
        assert_eq!(
            received[0].body,
            json!({ "recipient": { "id": "U1" }, "message": { "text": "Hello!" } })
        );
    }

    #[tokio::test]
    async fn test_send_message_rejected_returns_none() {
        let (base_url, received) = spawn_graph(
            StatusCode::BAD_REQUEST,
            json!({ "error": { "message": "Invalid OAuth access token" } }),
        )
        .await;
        let client = GraphClient::new(base_url, Some("bad".into()), Some("1784".into())).unwrap();

        let result = client.send_message("U1", "Hello!").await;
        assert!(matches!(result, Ok(None)));
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_send_message_not_configured() {
        // Nothing listens here; a network attempt would surface as Err
        let client = GraphClient::new("http://127.0.0.1:9", None, Some("1784".into())).unwrap();
        assert!(matches!(client.send_message("U1", "hi").await, Ok(None)));

        let client = GraphClient::new("http://127.0.0.1:9", Some("token".into()), None).unwrap();
        assert!(matches!(client.send_message("U1", "hi").await, Ok(None)));
    }

    #[tokio::test]
    async fn test_transport_error_maps_to_messaging_error() {
        let client =
            GraphClient::new("http://127.0.0.1:9", Some("token".into()), Some("1784".into())).unwrap();

        let err = MessageSender::send(&client, "U1", "hi").await.unwrap_err();
        assert!(matches!(err, common::Error::Messaging(_)));
    }
}
