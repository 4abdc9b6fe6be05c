//! Webhook payload parsing
//!
//! Instagram message notifications arrive as
//! `entry[] -> changes[] -> value -> messages`, but the shape of the leaves
//! varies between Graph API versions. Each loosely-typed field is classified
//! into one of the known shapes below; anything else is treated as absent so
//! extraction never fails.

use common::models::ExtractedMessage;
use serde_json::{Map, Value};
use tracing::debug;

type Object = Map<String, Value>;

/// The `messages` field of a change value, falling back to `message`
#[derive(Debug, Clone, Copy)]
pub enum MessagesField<'a> {
    One(&'a Object),
    Many(&'a [Value]),
    Absent,
}

impl<'a> MessagesField<'a> {
    pub fn classify(value: &'a Value) -> Self {
        let field = value
            .get("messages")
            .filter(|v| is_truthy(v))
            .or_else(|| value.get("message").filter(|v| is_truthy(v)));

        match field {
            Some(Value::Object(message)) => MessagesField::One(message),
            Some(Value::Array(messages)) => MessagesField::Many(messages),
            _ => MessagesField::Absent,
        }
    }

    /// Message objects in payload order; non-object list items are dropped
    pub fn objects(self) -> Vec<&'a Object> {
        match self {
            MessagesField::One(message) => vec![message],
            MessagesField::Many(messages) => messages.iter().filter_map(Value::as_object).collect(),
            MessagesField::Absent => Vec::new(),
        }
    }
}

/// Where a message's sender id came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderField {
    /// `"from": {"id": "..."}`
    Nested(String),
    /// `"from": "..."`
    Flat(String),
    Absent,
}

impl SenderField {
    pub fn classify(message: &Object) -> Self {
        match message.get("from") {
            Some(Value::Object(from)) => match from.get("id").and_then(id_string) {
                Some(id) => SenderField::Nested(id),
                None => SenderField::Absent,
            },
            Some(from) => match id_string(from) {
                Some(id) => SenderField::Flat(id),
                None => SenderField::Absent,
            },
            None => SenderField::Absent,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            SenderField::Nested(id) | SenderField::Flat(id) => Some(id.as_str()),
            SenderField::Absent => None,
        }
    }
}

/// Where a message's text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextField {
    /// `"text": "..."` or `"message": "..."`
    Plain(String),
    /// `"text": {"body": "..."}`
    Structured(String),
    Absent,
}

impl TextField {
    pub fn classify(message: &Object) -> Self {
        match (message.get("text"), message.get("message")) {
            (Some(Value::String(text)), _) if !text.is_empty() => TextField::Plain(text.clone()),
            (_, Some(Value::String(text))) if !text.is_empty() => TextField::Plain(text.clone()),
            (Some(Value::Object(text)), _) => match text.get("body") {
                Some(Value::String(body)) => TextField::Structured(body.clone()),
                _ => TextField::Absent,
            },
            _ => TextField::Absent,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            TextField::Plain(text) | TextField::Structured(text) => text,
            TextField::Absent => String::new(),
        }
    }
}

/// A message object found in a payload, before the sender check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCandidate {
    pub sender: SenderField,
    pub text: TextField,
}

impl MessageCandidate {
    fn from_object(message: &Object) -> Self {
        Self {
            sender: SenderField::classify(message),
            text: TextField::classify(message),
        }
    }

    /// `None` when no sender id could be resolved
    pub fn into_extracted(self) -> Option<ExtractedMessage> {
        let sender_id = match self.sender {
            SenderField::Nested(id) | SenderField::Flat(id) => id,
            SenderField::Absent => return None,
        };
        Some(ExtractedMessage {
            sender_id,
            text: self.text.into_text(),
        })
    }
}

/// Walk a payload and return every message object it carries, in order
pub fn scan(payload: &Value) -> Vec<MessageCandidate> {
    let mut candidates = Vec::new();

    for entry in list(payload.get("entry")) {
        for change in list(entry.get("changes")) {
            let value = match change.get("value") {
                Some(value) if value.is_object() => value,
                _ => continue,
            };
            for message in MessagesField::classify(value).objects() {
                candidates.push(MessageCandidate::from_object(message));
            }
        }
    }

    debug!("Found {} message candidates in payload", candidates.len());
    candidates
}

/// Extract every (sender, text) pair that has a resolvable sender
pub fn extract_messages(payload: &Value) -> Vec<ExtractedMessage> {
    scan(payload)
        .into_iter()
        .filter_map(MessageCandidate::into_extracted)
        .collect()
}

fn list(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Empty strings, lists, objects, zero, `false` and `null` all count as missing
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
