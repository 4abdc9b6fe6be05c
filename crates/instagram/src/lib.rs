//! Instagram messaging: webhook verification, payload extraction and the
//! Graph API send client

pub mod client;
pub mod verify;
pub mod webhooks;


pub use client::{ClientError, GraphClient, MessageSender};
pub use verify::{check_signature, sign, verify_signature, SignatureCheck, CheckSkipped};
pub use webhooks::{extract_messages, scan, MessageCandidate, MessagesField, SenderField, TextField};
