//! Webhook event handler

use common::models::{DispatchOutcome, DispatchSummary, SkipReason};
use instagram::{MessageCandidate, MessageSender};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::reply::ReplyGenerator;

/// Turns inbound message notifications into sent replies
#[derive(Clone)]
pub struct EventHandler {
    generator: Arc<dyn ReplyGenerator>,
    sender: Arc<dyn MessageSender>,
}

impl EventHandler {
    pub fn new(generator: Arc<dyn ReplyGenerator>, sender: Arc<dyn MessageSender>) -> Self {
        Self { generator, sender }
    }

    /// Process a webhook payload
    ///
    /// Messages are handled one at a time in payload order. A failure on one
    /// message is recorded in its outcome and does not stop the others.
    pub async fn handle(&self, payload: &Value) -> Vec<DispatchOutcome> {
        let candidates = instagram::scan(payload);
        let mut outcomes = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let outcome = self.dispatch(candidate).await;
            log_outcome(&outcome);
            outcomes.push(outcome);
        }

        let summary = DispatchSummary::from_outcomes(&outcomes);
        info!(
            sent = summary.sent,
            skipped = summary.skipped,
            generation_failed = summary.generation_failed,
            send_failed = summary.send_failed,
            "Processed {} messages",
            summary.total()
        );

        outcomes
    }

    async fn dispatch(&self, candidate: MessageCandidate) -> DispatchOutcome {
        let message = match candidate.into_extracted() {
            Some(message) => message,
            None => {
                return DispatchOutcome::Skipped {
                    reason: SkipReason::MissingSender,
                }
            }
        };
        debug!(sender = %message.sender_id, "Generating reply");

        // History is not tracked; every reply is single-turn
        let reply = match self.generator.generate(&message.text, &[]).await {
            Ok(reply) => reply,
            Err(e) => {
                return DispatchOutcome::GenerationFailed {
                    recipient: message.sender_id,
                    error: e.to_string(),
                }
            }
        };

        match self.sender.send(&message.sender_id, &reply).await {
            Ok(Some(_)) => DispatchOutcome::Sent {
                recipient: message.sender_id,
            },
            Ok(None) => DispatchOutcome::SendFailed {
                recipient: message.sender_id,
                error: "message was not delivered".to_string(),
            },
            Err(e) => DispatchOutcome::SendFailed {
                recipient: message.sender_id,
                error: e.to_string(),
            },
        }
    }
}

fn log_outcome(outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Sent { recipient } => {
            info!(outcome = outcome.as_str(), recipient = %recipient, "Reply sent")
        }
        DispatchOutcome::Skipped { reason } => {
            debug!(outcome = outcome.as_str(), reason = ?reason, "Message skipped")
        }
        DispatchOutcome::GenerationFailed { recipient, error } => warn!(
            outcome = outcome.as_str(),
            recipient = %recipient,
            "Reply generation failed: {}",
            error
        ),
        DispatchOutcome::SendFailed { recipient, error } => warn!(
            outcome = outcome.as_str(),
            recipient = %recipient,
            "Reply send failed: {}",
            error
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::models::ChatTurn;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubGenerator {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl ReplyGenerator for StubGenerator {
        async fn generate(&self, text: &str, history: &[ChatTurn]) -> common::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(history.is_empty());
            if self.fail_on == Some(text) {
                return Err(common::Error::ChatCompletion("upstream timeout".to_string()));
            }
            Ok(format!("re: {}", text))
        }
    }

    #[derive(Default)]
    struct StubSender {
        sent: Mutex<Vec<(String, String)>>,
        reject: Option<&'static str>,
    }

    #[async_trait]
    impl MessageSender for StubSender {
        async fn send(&self, recipient_id: &str, text: &str) -> common::Result<Option<Value>> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient_id.to_string(), text.to_string()));
            if self.reject == Some(recipient_id) {
                return Ok(None);
            }
            Ok(Some(json!({ "recipient_id": recipient_id })))
        }
    }

    fn payload(messages: Value) -> Value {
        json!({ "entry": [{ "changes": [{ "value": { "messages": messages } }] }] })
    }

    #[tokio::test]
    async fn test_dispatches_each_message_with_sender() {
        let generator = Arc::new(StubGenerator::default());
        let sender = Arc::new(StubSender::default());
        let handler = EventHandler::new(generator.clone(), sender.clone());

        let outcomes = handler
            .handle(&payload(json!([
                { "from": { "id": "U1" }, "text": "hi" },
                { "text": "no sender" },
                { "from": { "id": "U2" }, "text": { "body": "price?" } }
            ])))
            .await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *sender.sent.lock().unwrap(),
            vec![
                ("U1".to_string(), "re: hi".to_string()),
                ("U2".to_string(), "re: price?".to_string()),
            ]
        );
        assert_eq!(
            outcomes,
            vec![
                DispatchOutcome::Sent {
                    recipient: "U1".to_string()
                },
                DispatchOutcome::Skipped {
                    reason: SkipReason::MissingSender
                },
                DispatchOutcome::Sent {
                    recipient: "U2".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_generation_failure_does_not_stop_loop() {
        let generator = Arc::new(StubGenerator {
            fail_on: Some("boom"),
            ..Default::default()
        });
        let sender = Arc::new(StubSender::default());
        let handler = EventHandler::new(generator.clone(), sender.clone());

        let outcomes = handler
            .handle(&payload(json!([
                { "from": { "id": "U1" }, "text": "boom" },
                { "from": { "id": "U2" }, "text": "fine" }
            ])))
            .await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
        assert!(matches!(&outcomes[0], DispatchOutcome::GenerationFailed { recipient, .. } if recipient == "U1"));
        assert_eq!(outcomes[1].as_str(), "sent");
    }

    #[tokio::test]
    async fn test_rejected_send_is_recorded() {
        let generator = Arc::new(StubGenerator::default());
        let sender = Arc::new(StubSender {
            reject: Some("U1"),
            ..Default::default()
        });
        let handler = EventHandler::new(generator, sender);

        let outcomes = handler
            .handle(&payload(json!([{ "from": { "id": "U1" }, "text": "hi" }])))
            .await;

        assert!(matches!(&outcomes[0], DispatchOutcome::SendFailed { recipient, .. } if recipient == "U1"));
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let generator = Arc::new(StubGenerator::default());
        let sender = Arc::new(StubSender::default());
        let handler = EventHandler::new(generator.clone(), sender);

        assert!(handler.handle(&json!({ "object": "instagram" })).await.is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }
}
