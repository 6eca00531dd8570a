//! In-memory message board

use board_core::Message;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct MessageBoard {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl MessageBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages in posting order
    pub async fn list(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    pub async fn post(&self, sender: &str, content: &str) -> Message {
        let message = Message::new(sender, content);
        self.messages.write().await.push(message.clone());
        debug!("Message {} posted by {}", message.id, sender);
        message
    }
}
