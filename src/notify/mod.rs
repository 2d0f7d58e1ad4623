// src/notify/mod.rs
pub mod distributor;
pub mod telegram;

use anyhow::Result;

pub use distributor::Distributor;
pub use telegram::TelegramClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// Render HTML markup (Telegram `parse_mode=HTML`).
    pub rich_formatting: bool,
    pub link_preview: bool,
}

/// Chat transport. The only signal callers use is success vs. error.
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str, opts: SendOptions) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Logs messages instead of posting them (`DRY_RUN=1`, local runs).
pub struct DryRunChat;

#[async_trait::async_trait]
impl ChatClient for DryRunChat {
    async fn send(&self, chat_id: &str, text: &str, opts: SendOptions) -> Result<()> {
        tracing::info!(
            target: "notify",
            chat_id,
            rich = opts.rich_formatting,
            chars = text.chars().count(),
            "dry run, message not sent:\n{text}"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
