//! Domain models
//!
//! Everything here lives for a single webhook delivery; nothing is persisted.

use serde::{Deserialize, Serialize};

/// A (sender, text) pair pulled out of an inbound webhook payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMessage {
    pub sender_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of a chat-completion conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No sender id could be resolved from the message object
    MissingSender,
}

/// What happened to one message found in a delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent { recipient: String },
    Skipped { reason: SkipReason },
    GenerationFailed { recipient: String, error: String },
    SendFailed { recipient: String, error: String },
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent { .. } => "sent",
            Self::Skipped { .. } => "skipped",
            Self::GenerationFailed { .. } => "generation_failed",
            Self::SendFailed { .. } => "send_failed",
        }
    }
}

/// Per-delivery tally of dispatch outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub sent: usize,
    pub skipped: usize,
    pub generation_failed: usize,
    pub send_failed: usize,
}

impl DispatchSummary {
    pub fn from_outcomes(outcomes: &[DispatchOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome {
                DispatchOutcome::Sent { .. } => summary.sent += 1,
                DispatchOutcome::Skipped { .. } => summary.skipped += 1,
                DispatchOutcome::GenerationFailed { .. } => summary.generation_failed += 1,
                DispatchOutcome::SendFailed { .. } => summary.send_failed += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.sent + self.skipped + self.generation_failed + self.send_failed
    }

    pub fn failed(&self) -> usize {
        self.generation_failed + self.send_failed
    }
}
