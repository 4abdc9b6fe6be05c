//! Application state

use common::Config;
use instagram::GraphClient;
use processor::{EventHandler, OpenAiReplyGenerator};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub event_handler: EventHandler,
}

impl AppState {
    /// Build the production clients from configuration
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let generator = OpenAiReplyGenerator::from_config(&config)?;
        let sender = GraphClient::from_config(&config)?;
        let event_handler = EventHandler::new(Arc::new(generator), Arc::new(sender));
        Ok(Self::with_handler(config, event_handler))
    }

    pub fn with_handler(config: Config, event_handler: EventHandler) -> Self {
        Self {
            config,
            event_handler,
        }
    }
}
