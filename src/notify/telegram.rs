use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatClient, SendOptions};

pub const API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API client. The bot token is owned by this instance only.
#[derive(Clone)]
pub struct TelegramClient {
    token: String,
    client: Client,
    api_base: String,
    timeout: Duration,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self {
            token,
            client: Client::new(),
            api_base: API_BASE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

impl<'a> SendMessage<'a> {
    fn new(chat_id: &'a str, text: &'a str, opts: SendOptions) -> Self {
        Self {
            chat_id,
            text,
            parse_mode: opts.rich_formatting.then_some("HTML"),
            disable_web_page_preview: !opts.link_preview,
        }
    }
}

#[derive(Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait::async_trait]
impl ChatClient for TelegramClient {
    async fn send(&self, chat_id: &str, text: &str, opts: SendOptions) -> Result<()> {
        let body = SendMessage::new(chat_id, text, opts);
        let rsp = self
            .client
            .post(self.send_url())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            // reqwest errors carry the URL, and with it the bot token
            .map_err(|e| anyhow!("telegram request failed: {}", e.without_url()))?;

        let status = rsp.status();
        let reply: ApiReply = rsp
            .json()
            .await
            .map_err(|e| anyhow!("telegram reply body (HTTP {status}): {}", e.without_url()))?;
        if !status.is_success() || !reply.ok {
            return Err(anyhow!(
                "telegram sendMessage rejected (HTTP {status}): {}",
                reply.description.unwrap_or_else(|| "no description".into())
            ));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
