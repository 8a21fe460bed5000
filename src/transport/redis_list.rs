use async_trait::async_trait;
use redis::aio::ConnectionManager;

use super::{Transport, TransportError};
use crate::message::ProfiledMessage;

/// Pushes each message as JSON onto a Redis list, keeping at most `cap`
/// entries (oldest dropped first).
///
/// `ConnectionManager` is cheaply cloneable and reconnects on its own; a send
/// that hits a dead connection just fails.
#[derive(Clone)]
pub struct RedisTransport {
    conn: ConnectionManager,
    list_key: String,
    cap: usize,
}

impl RedisTransport {
    pub async fn connect(
        url: &str,
        list_key: impl Into<String>,
        cap: usize,
    ) -> Result<Self, TransportError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::from_connection(conn, list_key, cap))
    }

    pub fn from_connection(
        conn: ConnectionManager,
        list_key: impl Into<String>,
        cap: usize,
    ) -> Self {
        Self {
            conn,
            list_key: list_key.into(),
            cap,
        }
    }

    pub fn list_key(&self) -> &str {
        &self.list_key
    }
}

#[async_trait]
impl Transport for RedisTransport {
    async fn send(&self, message: &ProfiledMessage) -> Result<(), TransportError> {
        let json = message.to_json()?;
        let mut conn = self.conn.clone();
        let keep_from = -(self.cap.max(1) as i64);

        redis::pipe()
            .cmd("RPUSH")
            .arg(&self.list_key)
            .arg(&json)
            .ignore()
            .cmd("LTRIM")
            .arg(&self.list_key)
            .arg(keep_from)
            .arg(-1)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;

        tracing::debug!(
            key = %self.list_key,
            bytes = json.len(),
            "profiled message pushed"
        );
        Ok(())
    }
}
