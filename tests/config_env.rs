// tests/config_env.rs
//
// Loading from the real process environment and the tuning file.
// Env is process-global, so every test here is serialized.

use std::io::Write;

use serial_test::serial;
use tech_news_digest::config::{missing_env_vars, AgentConfig, ConfigError, LlmProvider};

const VARS: [&str; 11] = [
    "ANTHROPIC_API_KEY",
    "OPENAI_API_KEY",
    "TELEGRAM_BOT_TOKEN",
    "TELEGRAM_CHAT_ID",
    "CRON_SECRET",
    "LLM_PROVIDER",
    "NEWS_LIMIT",
    "DIGEST_CONFIG_PATH",
    "DIGEST_INTERVAL_SECS",
    "DRY_RUN",
    "APP_ENV",
];

fn clear() {
    for k in VARS {
        std::env::remove_var(k);
    }
}

fn set_required() {
    std::env::set_var("ANTHROPIC_API_KEY", "sk-ant-test");
    std::env::set_var("TELEGRAM_BOT_TOKEN", "123:abc");
    std::env::set_var("TELEGRAM_CHAT_ID", "-100");
}

#[test]
#[serial]
fn env_values_load() {
    clear();
    set_required();
    std::env::set_var("NEWS_LIMIT", "25");
    std::env::set_var("DRY_RUN", "1");
    std::env::set_var("APP_ENV", "development");

    let cfg = AgentConfig::from_env().expect("config loads");
    assert_eq!(cfg.news_limit, 25);
    assert!(cfg.dry_run);
    assert!(cfg.dev_mode);
    assert_eq!(cfg.llm_api_key, "sk-ant-test");
    clear();
}

#[test]
#[serial]
fn file_values_apply_under_env() {
    clear();
    set_required();
    let mut f = tempfile::NamedTempFile::new().expect("tmp file");
    writeln!(f, "news_limit = 7\nllm_provider = \"openai\"\ninterval_secs = 3600").expect("write");
    std::env::set_var("DIGEST_CONFIG_PATH", f.path());
    std::env::set_var("OPENAI_API_KEY", "sk-oa");
    std::env::set_var("NEWS_LIMIT", "3");

    let cfg = AgentConfig::from_env().expect("config loads");
    assert_eq!(cfg.llm_provider, LlmProvider::OpenAi);
    assert_eq!(cfg.llm_api_key, "sk-oa");
    assert_eq!(cfg.news_limit, 3, "env wins over file");
    assert_eq!(cfg.interval_secs, Some(3600));
    clear();
}

#[test]
#[serial]
fn dangling_config_path_is_an_error() {
    clear();
    set_required();
    std::env::set_var("DIGEST_CONFIG_PATH", "/definitely/not/here.toml");
    let err = AgentConfig::from_env().expect_err("missing file");
    assert!(matches!(err, ConfigError::File { .. }));
    clear();
}

#[test]
#[serial]
fn provider_choice_changes_the_required_key() {
    clear();
    std::env::set_var("LLM_PROVIDER", "openai");
    let missing = missing_env_vars();
    assert_eq!(
        missing,
        ["OPENAI_API_KEY", "TELEGRAM_BOT_TOKEN", "TELEGRAM_CHAT_ID", "CRON_SECRET"]
    );
    clear();
}
