// src/config/mod.rs
pub mod agent;

pub use agent::{missing_env_vars, AgentConfig, ConfigError, LlmProvider};
