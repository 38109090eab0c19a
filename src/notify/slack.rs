// src/notify/slack.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::Notifier;

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
}

impl SlackNotifier {
    /// Requires `SLACK_WEBHOOK_URL`; a scan without a configured sink is a
    /// startup error, not a silent no-op.
    pub fn from_env() -> Result<Self> {
        let webhook_url =
            std::env::var("SLACK_WEBHOOK_URL").context("SLACK_WEBHOOK_URL is not set")?;
        Ok(Self::new(webhook_url))
    }

    /// Builder for tests/tools.
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let body = serde_json::json!({ "text": text });

        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .context("slack post")?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            bail!("slack returned {status}: {detail}");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
