use anyhow::Context;
use async_trait::async_trait;

use super::MessagingProvider;

pub struct UltraMsgProvider {
    instance_id: String,
    token: String,
    client: reqwest::Client,
}

impl UltraMsgProvider {
    pub fn new(instance_id: String, token: String) -> Self {
        Self {
            instance_id,
            token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MessagingProvider for UltraMsgProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        let url = format!(
            "https://api.ultramsg.com/{}/messages/chat",
            self.instance_id
        );

        self.client
            .post(&url)
            .form(&[("token", self.token.as_str()), ("to", to), ("body", body)])
            .send()
            .await
            .context("failed to send UltraMsg message")?
            .error_for_status()
            .context("UltraMsg API returned error")?;

        Ok(())
    }
}
