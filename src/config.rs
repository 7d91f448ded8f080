use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::corpus::MAX_CORPUS_CHARS;
use crate::connector_fs::MAX_FILE_CHARS;
use crate::extract::MAX_DOCUMENT_CHARS;

/// Environment variable that overrides `oracle.model` at startup.
pub const MODEL_ENV: &str = "LLM_MODEL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub walker: WalkerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Unset means the oracle call has no deadline.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            endpoint: default_endpoint(),
            timeout_secs: None,
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_api_key_env() -> String {
    "LLM_API_KEY".to_string()
}
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

/// Credential and model identifier, read once when the process starts.
#[derive(Debug, Clone)]
pub struct OracleCredentials {
    pub api_key: Option<String>,
    pub model: String,
}

impl OracleConfig {
    /// Reads the API key (and an optional model override) from the
    /// environment. A missing key is not an error here: every request that
    /// needs the oracle fails instead.
    pub fn resolve_credentials(&self) -> OracleCredentials {
        let api_key = std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        let model = std::env::var(MODEL_ENV)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.model.clone());
        OracleCredentials { api_key, model }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    #[serde(default = "default_corpus_max_chars")]
    pub corpus_max_chars: usize,
    #[serde(default = "default_file_max_chars")]
    pub file_max_chars: usize,
    #[serde(default = "default_document_max_chars")]
    pub document_max_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            corpus_max_chars: MAX_CORPUS_CHARS,
            file_max_chars: MAX_FILE_CHARS,
            document_max_chars: MAX_DOCUMENT_CHARS,
        }
    }
}

fn default_corpus_max_chars() -> usize {
    MAX_CORPUS_CHARS
}
fn default_file_max_chars() -> usize {
    MAX_FILE_CHARS
}
fn default_document_max_chars() -> usize {
    MAX_DOCUMENT_CHARS
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WalkerConfig {
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_depth")]
    pub depth: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
        }
    }
}

fn default_depth() -> u32 {
    1
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.limits.corpus_max_chars == 0 {
        anyhow::bail!("limits.corpus_max_chars must be > 0");
    }
    if config.limits.file_max_chars == 0 {
        anyhow::bail!("limits.file_max_chars must be > 0");
    }
    if config.limits.document_max_chars == 0 {
        anyhow::bail!("limits.document_max_chars must be > 0");
    }
    if config.fetch.depth == 0 {
        anyhow::bail!("fetch.depth must be >= 1");
    }
    if config.oracle.model.trim().is_empty() {
        anyhow::bail!("oracle.model must not be empty");
    }

    match config.oracle.provider.as_str() {
        "gemini" => {}
        other => anyhow::bail!("Unknown oracle provider: '{}'. Must be gemini.", other),
    }

    for pattern in &config.walker.exclude_globs {
        globset::Glob::new(pattern)
            .with_context(|| format!("Invalid walker.exclude_globs pattern: {}", pattern))?;
    }

    Ok(())
}
