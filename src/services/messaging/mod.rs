pub mod ultramsg;

use async_trait::async_trait;

/// Outbound delivery seam. The dialogue core never sends messages itself;
/// it hands the reply back to the transport, which uses this.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()>;
}
