//! Layered configuration for ragline.
//!
//! Sources, highest priority first:
//! - an explicit TOML file (`--config`)
//! - TOML files (default: ~/.config/ragline/ragline.toml)
//! - environment variables
//!
//! TOML values may reference environment variables as `${VAR_NAME}`.
//!
//! # Example
//!
//! ```no_run
//! use ragline_chat::config::RagConfig;
//!
//! let config = RagConfig::load(None).expect("Failed to load");
//! println!("searching index {}", config.search.index_name);
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ragline_core::{defaults, CallPolicy, EmbeddingModel, Error, Result};
use ragline_inference::openai::{AuthHeader, DEFAULT_OPENAI_URL};

/// Default index name when none is configured.
pub const DEFAULT_INDEX_NAME: &str = "ragline-index";

/// How the inference API key is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthStyle {
    #[default]
    Bearer,
    ApiKey,
}

impl From<AuthStyle> for AuthHeader {
    fn from(style: AuthStyle) -> Self {
        match style {
            AuthStyle::Bearer => AuthHeader::Bearer,
            AuthStyle::ApiKey => AuthHeader::ApiKey,
        }
    }
}

/// `[inference]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub auth_header: AuthStyle,
    pub embedding_model: String,
    /// Model used for intent mapping.
    pub intent_model: String,
    /// Model used for the grounded answer.
    pub chat_model: String,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_URL.to_string(),
            api_key: None,
            auth_header: AuthStyle::Bearer,
            embedding_model: defaults::EMBED_MODEL.to_string(),
            intent_model: defaults::GEN_MODEL.to_string(),
            chat_model: defaults::GEN_MODEL.to_string(),
        }
    }
}

/// Which search backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackendKind {
    #[default]
    Azure,
    Memory,
}

impl FromStr for SearchBackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "azure" => Ok(Self::Azure),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Config(format!(
                "unknown search backend '{}' (expected azure or memory)",
                other
            ))),
        }
    }
}

/// `[search]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub backend: SearchBackendKind,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub index_name: String,
    pub hnsw_m: u32,
    pub hnsw_ef_construction: u32,
    pub hnsw_ef_search: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            backend: SearchBackendKind::Azure,
            endpoint: None,
            api_key: None,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            hnsw_m: defaults::HNSW_M,
            hnsw_ef_construction: defaults::HNSW_EF_CONSTRUCTION,
            hnsw_ef_search: defaults::HNSW_EF_SEARCH,
        }
    }
}

/// `[retrieval]` section. The timeout and retry settings apply to every
/// remote call, at query and at ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    /// Directory searched for `<name>.prompty` overrides.
    pub prompt_dir: Option<PathBuf>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top: defaults::TOP,
            timeout_secs: defaults::TIMEOUT_SECS,
            max_retries: defaults::MAX_RETRIES,
            retry_base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            prompt_dir: None,
        }
    }
}

/// `[ingestion]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionSettings {
    pub content_column: String,
    pub concurrency: usize,
    /// Content file indexed at startup when the in-memory backend is used.
    pub source: Option<PathBuf>,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            content_column: defaults::CONTENT_COLUMN.to_string(),
            concurrency: defaults::INGEST_CONCURRENCY,
            source: None,
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
        }
    }
}

/// Complete ragline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub inference: InferenceSettings,
    pub search: SearchSettings,
    pub retrieval: RetrievalSettings,
    pub ingestion: IngestionSettings,
    pub server: ServerSettings,
}

impl RagConfig {
    /// Get the default config file path.
    ///
    /// Returns: ~/.config/ragline/ragline.toml
    pub fn default_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        path.push("ragline");
        path.push("ragline.toml");
        path
    }

    /// Load from `path`, else the default file, else the environment.
    /// The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                info!("Loading config from: {}", path.display());
                Self::from_file(path)?
            }
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    info!("Loading config from: {}", default_path.display());
                    Self::from_file(&default_path)?
                } else {
                    debug!(
                        "Config file not found at {}, using environment variables",
                        default_path.display()
                    );
                    Self::from_env()?
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content)?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("invalid config: {}", e)))
    }

    /// Build from environment variables on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("OPENAI_BASE_URL") {
            config.inference.base_url = v;
        }
        config.inference.api_key = get("OPENAI_API_KEY");
        if let Some(v) = get("EMBEDDINGS_MODEL") {
            config.inference.embedding_model = v;
        }
        if let Some(v) = get("INTENT_MAPPING_MODEL") {
            config.inference.intent_model = v;
        }
        if let Some(v) = get("CHAT_MODEL") {
            config.inference.chat_model = v;
        }

        if let Some(v) = get("RAGLINE_SEARCH_BACKEND") {
            config.search.backend = v.parse()?;
        }
        config.search.endpoint = get("AISEARCH_ENDPOINT");
        config.search.api_key = get("AISEARCH_KEY");
        if let Some(v) = get("AISEARCH_INDEX_NAME") {
            config.search.index_name = v;
        }

        if let Some(v) = get("RAGLINE_TOP") {
            config.retrieval.top = parse_number("RAGLINE_TOP", &v)?;
        }
        if let Some(v) = get("RAGLINE_TIMEOUT_SECS") {
            config.retrieval.timeout_secs = parse_number("RAGLINE_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("RAGLINE_MAX_RETRIES") {
            config.retrieval.max_retries = parse_number("RAGLINE_MAX_RETRIES", &v)?;
        }
        config.retrieval.prompt_dir = get("RAGLINE_PROMPT_DIR").map(PathBuf::from);

        config.ingestion.source = get("RAGLINE_SOURCE_FILE").map(PathBuf::from);

        if let Some(v) = get("HOST") {
            config.server.host = v;
        }
        if let Some(v) = get("PORT") {
            config.server.port = parse_number("PORT", &v)?;
        }

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.embedding_model()?;

        check_url("inference.base_url", &self.inference.base_url)?;
        for (key, value) in [
            ("inference.intent_model", &self.inference.intent_model),
            ("inference.chat_model", &self.inference.chat_model),
            ("search.index_name", &self.search.index_name),
            ("ingestion.content_column", &self.ingestion.content_column),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", key)));
            }
        }

        if self.search.backend == SearchBackendKind::Azure {
            match &self.search.endpoint {
                Some(endpoint) => check_url("search.endpoint", endpoint)?,
                None => {
                    return Err(Error::Config(
                        "search.endpoint (AISEARCH_ENDPOINT) is required for the azure backend"
                            .to_string(),
                    ))
                }
            }
        }

        if self.ingestion.concurrency == 0 {
            return Err(Error::Config(
                "ingestion.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved embedding model. Unknown identifiers are rejected.
    pub fn embedding_model(&self) -> Result<EmbeddingModel> {
        self.inference.embedding_model.parse()
    }

    pub fn call_policy(&self) -> CallPolicy {
        CallPolicy {
            timeout_secs: self.retrieval.timeout_secs,
            max_retries: self.retrieval.max_retries,
            base_delay_ms: self.retrieval.retry_base_delay_ms,
        }
    }
}

fn check_url(key: &str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            key, value
        )))
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, value)))
}

/// Substitute environment variables in the format ${VAR_NAME}.
/// Unset variables are left as written.
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| Error::Config(format!("substitution pattern: {}", e)))?;
    Ok(re
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned())
}
