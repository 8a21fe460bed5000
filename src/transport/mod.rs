//! Delivery seam for profiled messages.
//!
//! One attempt per send. Nothing here retries or guarantees delivery.

mod redis_list;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::message::ProfiledMessage;

pub use redis_list::RedisTransport;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("receiver dropped")]
    Closed,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &ProfiledMessage) -> Result<(), TransportError>;
}

/// In-process transport backed by an unbounded tokio channel.
pub struct ChannelTransport {
    tx: UnboundedSender<ProfiledMessage>,
}

impl ChannelTransport {
    pub fn new() -> (Self, UnboundedReceiver<ProfiledMessage>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, message: &ProfiledMessage) -> Result<(), TransportError> {
        self.tx
            .send(message.clone())
            .map_err(|_| TransportError::Closed)
    }
}
