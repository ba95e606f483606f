//! TOML configuration.
//!
//! Every section has defaults, so a missing default config file yields a
//! working setup. Credentials never live in the file: the OpenAI key is read
//! from `OPENAI_API_KEY`, which may come from a `.env` file loaded at startup.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the API credential for the `openai` providers.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_CONFIG_PATH: &str = "./config/jobjob.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/jobjob.sqlite")
}

/// Chunk sizes are measured in characters, not bytes.
#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_embedding_model(),
            dims: default_dims(),
            batch_size: default_batch_size(),
            max_retries: 0,
            timeout_secs: default_embedding_timeout_secs(),
            base_url: default_base_url(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_batch_size() -> usize {
    64
}
fn default_embedding_timeout_secs() -> u64 {
    30
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_llm_timeout_secs(),
            base_url: default_base_url(),
        }
    }
}

fn default_llm_model() -> String {
    "gpt-4.1".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_llm_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_prompt_dir")]
    pub prompt_dir: PathBuf,
    #[serde(default = "default_personal_context")]
    pub personal_context: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            prompt_dir: default_prompt_dir(),
            personal_context: default_personal_context(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./context/uploads")
}
fn default_prompt_dir() -> PathBuf {
    PathBuf::from("./context/prompts")
}
fn default_personal_context() -> PathBuf {
    PathBuf::from("./context/background/personal_context.txt")
}

impl EmbeddingConfig {
    pub fn needs_api_key(&self) -> bool {
        self.provider == "openai"
    }
}

impl LlmConfig {
    pub fn needs_api_key(&self) -> bool {
        self.provider == "openai"
    }
}

/// Returns the API key from the environment, or a configuration error naming
/// the variable to set.
pub fn api_key() -> Result<String> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!(
            "{} is not set. Add it to your environment or to a .env file.",
            API_KEY_ENV
        ),
    }
}

/// Load and validate a config file.
///
/// When `explicit` is false and the file does not exist, defaults are used.
pub fn load_config(path: &Path, explicit: bool) -> Result<Config> {
    if !path.exists() && !explicit {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        bail!(
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.chunk_overlap,
            config.chunking.chunk_size
        );
    }

    if config.retrieval.top_k == 0 {
        bail!("retrieval.top_k must be >= 1");
    }

    if config.embedding.dims == 0 {
        bail!("embedding.dims must be > 0");
    }
    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }
    match config.embedding.provider.as_str() {
        "openai" | "hash" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be openai or hash.",
            other
        ),
    }

    if !(0.0..=2.0).contains(&config.llm.temperature) {
        bail!("llm.temperature must be in [0.0, 2.0]");
    }
    match config.llm.provider.as_str() {
        "openai" => {}
        other => bail!("Unknown llm provider: '{}'. Must be openai.", other),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.chunking.chunk_size, 1000);
        assert_eq!(cfg.chunking.chunk_overlap, 200);
        assert_eq!(cfg.retrieval.top_k, 4);
        assert_eq!(cfg.embedding.model, "text-embedding-ada-002");
        assert_eq!(cfg.llm.model, "gpt-4.1");
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn missing_implicit_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(&tmp.path().join("nope.toml"), false).unwrap();
        assert_eq!(cfg.retrieval.top_k, 4);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_config(&tmp.path().join("nope.toml"), true).is_err());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("jobjob.toml");
        std::fs::write(
            &path,
            "[chunking]\nchunk_size = 500\nchunk_overlap = 50\n\n[embedding]\nprovider = \"hash\"\ndims = 64\n",
        )
        .unwrap();
        let cfg = load_config(&path, true).unwrap();
        assert_eq!(cfg.chunking.chunk_size, 500);
        assert_eq!(cfg.chunking.chunk_overlap, 50);
        assert_eq!(cfg.embedding.provider, "hash");
        assert_eq!(cfg.embedding.dims, 64);
        assert_eq!(cfg.llm.temperature, 0.7);
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let mut cfg = Config::default();
        cfg.chunking.chunk_overlap = cfg.chunking.chunk_size;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn unknown_embedding_provider_rejected() {
        let mut cfg = Config::default();
        cfg.embedding.provider = "carrier-pigeon".to_string();
        let err = validate(&cfg).unwrap_err().to_string();
        assert!(err.contains("carrier-pigeon"));
    }

    #[test]
    fn temperature_out_of_range_rejected() {
        let mut cfg = Config::default();
        cfg.llm.temperature = 3.5;
        assert!(validate(&cfg).is_err());
    }
}
