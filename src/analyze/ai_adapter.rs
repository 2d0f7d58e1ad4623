//! Language model adapters: the completion contract plus Anthropic and OpenAI clients.
//! Credentials are handed to each client at construction; nothing reads or writes
//! process-wide state after that.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{AgentConfig, LlmProvider};

pub const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-latest";

pub const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_output_tokens: 1000,
        }
    }
}

/// Text completion. Returns the raw model text; callers do their own parsing.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, opts: CompletionOptions) -> Result<String>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynLanguageModel = Arc<dyn LanguageModel>;

/// Factory: pick the provider named by config.
pub fn build_language_model(cfg: &AgentConfig) -> Result<DynLanguageModel> {
    let model = cfg.llm_model.clone();
    Ok(match cfg.llm_provider {
        LlmProvider::Anthropic => Arc::new(AnthropicModel::new(cfg.llm_api_key.clone(), model)?),
        LlmProvider::OpenAi => Arc::new(OpenAiModel::new(cfg.llm_api_key.clone(), model)?),
    })
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("tech-news-digest/0.1")
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(60))
        .build()
        .context("building llm http client")
}

// ------------------------------------------------------------
// Anthropic (Messages API)
// ------------------------------------------------------------

pub struct AnthropicModel {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl AnthropicModel {
    pub fn new(api_key: String, model_override: Option<String>) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            api_key,
            model: model_override.unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            url: ANTHROPIC_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct AnthropicReq<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResp {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

fn anthropic_text(resp: AnthropicResp) -> Result<String> {
    let text: String = resp
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .map(|b| b.text)
        .collect();
    if text.is_empty() {
        return Err(anyhow!("anthropic response had no text block"));
    }
    Ok(text)
}

#[async_trait::async_trait]
impl LanguageModel for AnthropicModel {
    async fn complete(&self, prompt: &str, opts: CompletionOptions) -> Result<String> {
        let req = AnthropicReq {
            model: &self.model,
            max_tokens: opts.max_output_tokens,
            temperature: opts.temperature,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };
        let body: AnthropicResp = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&req)
            .send()
            .await
            .context("anthropic request")?
            .error_for_status()
            .context("anthropic non-2xx")?
            .json()
            .await
            .context("anthropic response body")?;
        anthropic_text(body)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

// ------------------------------------------------------------
// OpenAI (Chat Completions API)
// ------------------------------------------------------------

pub struct OpenAiModel {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiModel {
    /// `model_override`: pass Some("gpt-4o") to override; defaults to gpt-4o-mini.
    pub fn new(api_key: String, model_override: Option<String>) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            api_key,
            model: model_override.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            url: OPENAI_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Serialize)]
struct OpenAiReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiResp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

/// Content of the first choice. Null or empty content counts as no answer.
fn openai_text(resp: OpenAiResp) -> Result<String> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("openai response had no content"))
}

#[async_trait::async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, prompt: &str, opts: CompletionOptions) -> Result<String> {
        let req = OpenAiReq {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: opts.temperature,
            max_tokens: opts.max_output_tokens,
        };
        let body: OpenAiResp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("openai request")?
            .error_for_status()
            .context("openai non-2xx")?
            .json()
            .await
            .context("openai response body")?;
        openai_text(body)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
