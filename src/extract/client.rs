// src/extract/client.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Chat-completion backend. One call per text chunk; implementations are
/// shared across the whole scan.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynChatModel = Arc<dyn ChatModel>;

const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";
const DEFAULT_MODEL: &str = "grok-2";

/// xAI Grok via the OpenAI-compatible chat-completions API.
/// Low temperature keeps the extraction output consistent.
pub struct XaiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl XaiClient {
    /// Requires `XAI_API_KEY`; `XAI_BASE_URL` overrides the endpoint (tests).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("XAI_API_KEY").context("XAI_API_KEY is not set")?;
        let base_url =
            std::env::var("XAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self::new(api_key, base_url))
    }

    pub fn new(api_key: String, base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("grants-radar/0.1 (+github.com/grants-radar)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(90))
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for XaiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: 0.1,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("model request")?
            .error_for_status()
            .context("model non-2xx")?;

        let body: Resp = resp.json().await.context("model response body")?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("model returned no choices"))
    }

    fn name(&self) -> &'static str {
        "xai"
    }
}
