//! The `Channel` transport trait — the boundary between the bot and a chat
//! platform. Command replies go through `send`; reminder notifications go
//! through `send_direct`, which resolves a user's private address.

use async_trait::async_trait;
use futures::stream::Stream;

use crate::error::Result;
use crate::types::{IncomingMessage, OutgoingMessage};

#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name, e.g. "discord".
    fn name(&self) -> &str;

    /// Establish the connection and verify credentials.
    async fn connect(&mut self) -> Result<()>;

    /// Tear down the connection.
    async fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Send a message into a channel/thread.
    async fn send(&self, message: OutgoingMessage) -> Result<()>;

    /// Deliver text to a user's private address (DM).
    async fn send_direct(&self, user_id: &str, text: &str) -> Result<()>;

    /// Stream of inbound messages.
    async fn listen(&self) -> Result<Box<dyn Stream<Item = IncomingMessage> + Send + Unpin>>;
}
