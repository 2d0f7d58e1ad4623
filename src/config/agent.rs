// src/config/agent.rs
//! Runtime configuration for the digest agent.
//!
//! Secrets come from the environment only. Non-secret tuning values may also come from
//! a TOML file (`$DIGEST_CONFIG_PATH`, then `config/digest.toml`); the environment wins.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";

pub const DEFAULT_NEWS_LIMIT: usize = 10;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("config file {}: {reason}", path.display())]
    File { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    OpenAi,
}

impl LlmProvider {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Some(Self::Anthropic),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn key_var(self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Optional tuning file. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub news_limit: Option<usize>,
    pub llm_provider: Option<String>,
    pub llm_model: Option<String>,
    pub retry_base_delay_ms: Option<u64>,
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub llm_provider: LlmProvider,
    pub llm_api_key: String,
    pub llm_model: Option<String>,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    /// Trigger credential. Only the HTTP layer needs it.
    pub cron_secret: Option<String>,
    pub news_limit: usize,
    pub retry_base_delay_ms: u64,
    /// Log the digest instead of posting it.
    pub dry_run: bool,
    /// `APP_ENV=development`
    pub dev_mode: bool,
    pub interval_secs: Option<u64>,
    pub metrics_enabled: bool,
}

impl AgentConfig {
    /// Load from the process environment (after `.env`) and the optional tuning file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let file = load_file_default()?;
        Self::from_lookup(|k| std::env::var(k).ok(), file)
    }

    /// Build from an arbitrary variable lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F, file: FileConfig) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider_raw = get("LLM_PROVIDER").or(file.llm_provider);
        let llm_provider = match provider_raw {
            Some(raw) => LlmProvider::parse(&raw).ok_or(ConfigError::Invalid {
                var: "LLM_PROVIDER",
                value: raw,
            })?,
            None => LlmProvider::Anthropic,
        };

        let key_var = llm_provider.key_var();
        let llm_api_key = get(key_var).ok_or(ConfigError::Missing(key_var))?;
        let telegram_bot_token =
            get("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        let telegram_chat_id =
            get("TELEGRAM_CHAT_ID").ok_or(ConfigError::Missing("TELEGRAM_CHAT_ID"))?;

        let news_limit = match get("NEWS_LIMIT") {
            Some(v) => parse_num("NEWS_LIMIT", v)?,
            None => file.news_limit.unwrap_or(DEFAULT_NEWS_LIMIT),
        };
        if news_limit == 0 {
            return Err(ConfigError::Invalid {
                var: "NEWS_LIMIT",
                value: "0".into(),
            });
        }
        let retry_base_delay_ms = match get("RETRY_BASE_DELAY_MS") {
            Some(v) => parse_num("RETRY_BASE_DELAY_MS", v)?,
            None => file
                .retry_base_delay_ms
                .unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
        };
        let interval_secs = match get("DIGEST_INTERVAL_SECS") {
            Some(v) => Some(parse_num("DIGEST_INTERVAL_SECS", v)?),
            None => file.interval_secs,
        }
        .filter(|s| *s > 0);

        Ok(Self {
            llm_provider,
            llm_api_key,
            llm_model: get("LLM_MODEL").or(file.llm_model),
            telegram_bot_token,
            telegram_chat_id,
            cron_secret: get("CRON_SECRET"),
            news_limit,
            retry_base_delay_ms,
            dry_run: flag(get("DRY_RUN")),
            dev_mode: get("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("development")),
            interval_secs,
            metrics_enabled: flag(get("METRICS_ENABLED")),
        })
    }
}

/// Required variables that are absent from the process environment.
pub fn missing_env_vars() -> Vec<&'static str> {
    missing_from(|k| std::env::var(k).ok())
}

pub(crate) fn missing_from<F>(lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    let provider = lookup("LLM_PROVIDER")
        .and_then(|p| LlmProvider::parse(&p))
        .unwrap_or(LlmProvider::Anthropic);
    [
        provider.key_var(),
        "TELEGRAM_BOT_TOKEN",
        "TELEGRAM_CHAT_ID",
        "CRON_SECRET",
    ]
    .into_iter()
    .filter(|k| lookup(k).map_or(true, |v| v.trim().is_empty()))
    .collect()
}

/// Load the tuning file from an explicit path.
pub fn load_file_from(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::File {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::File {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// 1) $DIGEST_CONFIG_PATH (must exist)
/// 2) config/digest.toml
/// 3) defaults
pub fn load_file_default() -> Result<FileConfig, ConfigError> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(ConfigError::File {
                path: pb,
                reason: "DIGEST_CONFIG_PATH points to non-existent path".into(),
            });
        }
        return load_file_from(&pb);
    }
    let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
    if fallback.exists() {
        return load_file_from(&fallback);
    }
    Ok(FileConfig::default())
}

fn parse_num<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { var, value })
}

fn flag(v: Option<String>) -> bool {
    matches!(v.as_deref(), Some("1") | Some("true") | Some("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> HashMap<String, String> {
        env(&[
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-10042"),
        ])
    }

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let vars = base();
        let cfg = AgentConfig::from_lookup(|k| vars.get(k).cloned(), FileConfig::default())
            .unwrap();
        assert_eq!(cfg.llm_provider, LlmProvider::Anthropic);
        assert_eq!(cfg.news_limit, DEFAULT_NEWS_LIMIT);
        assert_eq!(cfg.retry_base_delay_ms, DEFAULT_RETRY_BASE_DELAY_MS);
        assert!(cfg.cron_secret.is_none());
        assert!(!cfg.dry_run);
        assert!(!cfg.dev_mode);
    }

    #[test]
    fn missing_chat_id_is_named() {
        let mut vars = base();
        vars.remove("TELEGRAM_CHAT_ID");
        let err = AgentConfig::from_lookup(|k| vars.get(k).cloned(), FileConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TELEGRAM_CHAT_ID")));
    }

    #[test]
    fn openai_provider_requires_openai_key() {
        let mut vars = base();
        vars.insert("LLM_PROVIDER".into(), "OpenAI".into());
        let err = AgentConfig::from_lookup(|k| vars.get(k).cloned(), FileConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPENAI_API_KEY")));
    }

    #[test]
    fn env_wins_over_file() {
        let mut vars = base();
        vars.insert("NEWS_LIMIT".into(), "7".into());
        let file = FileConfig {
            news_limit: Some(20),
            retry_base_delay_ms: Some(5),
            ..FileConfig::default()
        };
        let cfg = AgentConfig::from_lookup(|k| vars.get(k).cloned(), file).unwrap();
        assert_eq!(cfg.news_limit, 7);
        assert_eq!(cfg.retry_base_delay_ms, 5);
    }

    #[test]
    fn garbage_numbers_are_rejected() {
        let mut vars = base();
        vars.insert("NEWS_LIMIT".into(), "ten".into());
        let err = AgentConfig::from_lookup(|k| vars.get(k).cloned(), FileConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "NEWS_LIMIT", .. }));
    }

    #[test]
    fn missing_report_lists_absent_and_blank_vars() {
        let vars = env(&[("ANTHROPIC_API_KEY", "k"), ("TELEGRAM_BOT_TOKEN", "  ")]);
        let missing = missing_from(|k| vars.get(k).cloned());
        assert_eq!(
            missing,
            vec!["TELEGRAM_BOT_TOKEN", "TELEGRAM_CHAT_ID", "CRON_SECRET"]
        );
    }

    #[test]
    fn toml_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("digest.toml");
        fs::write(&p, "news_limit = 15\nllm_provider = \"openai\"\n").unwrap();
        let f = load_file_from(&p).unwrap();
        assert_eq!(f.news_limit, Some(15));
        assert_eq!(f.llm_provider.as_deref(), Some("openai"));
    }
}
