//! Reply generation and webhook dispatch

pub mod handler;
pub mod reply;

pub use handler::EventHandler;
pub use reply::{OpenAiReplyGenerator, ReplyError, ReplyGenerator, MISSING_API_KEY_REPLY};
