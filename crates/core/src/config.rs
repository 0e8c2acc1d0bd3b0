//! Configuration management for DocForge.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Host-provided overrides
//! - Config files (.docforge/config.yaml)
//!
//! The configuration is workspace-centric, with most state stored in `.docforge/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docforge/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Default LLM provider ("openai" or "ollama")
    pub provider: String,

    /// Default model identifier
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Knowledge engine tuning
    pub engine: EngineSettings,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    /// Providers tried in order when the active provider fails or returns nothing
    #[serde(rename = "fallbackProviders", default)]
    pub fallback_providers: Vec<String>,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Endpoint override for this provider, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }
}

/// Tuning knobs for the content pipeline.
///
/// Every field has a default so a config file only needs to name what it
/// changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Version string stamped on every article
    #[serde(default = "default_engine_version")]
    pub engine_version: String,

    /// Upper bound for a single LLM call
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    /// Characters of source content embedded in each user prompt
    #[serde(default = "default_max_source_chars")]
    pub max_source_chars: usize,

    /// Content types forced to a single article when short
    #[serde(default = "default_unified_override_types")]
    pub unified_override_types: Vec<String>,

    /// Word count below which the unified override applies
    #[serde(default = "default_unified_override_max_words")]
    pub unified_override_max_words: usize,

    /// Documents shorter than this always stay a single article
    #[serde(default = "default_min_split_words")]
    pub min_split_words: usize,

    /// Capacity of the in-process metrics ring buffer
    #[serde(default = "default_metrics_capacity")]
    pub metrics_capacity: usize,

    /// Sampling temperature for article generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token budget for each generated article
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// SQLite document library, relative to `.docforge/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

fn default_engine_version() -> String {
    "2.0".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    300
}

fn default_max_source_chars() -> usize {
    25_000
}

fn default_unified_override_types() -> Vec<String> {
    vec!["tutorial".to_string(), "installation_guide".to_string()]
}

fn default_unified_override_max_words() -> usize {
    2000
}

fn default_min_split_words() -> usize {
    500
}

fn default_metrics_capacity() -> usize {
    1000
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    4000
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            engine_version: default_engine_version(),
            llm_timeout_secs: default_llm_timeout_secs(),
            max_source_chars: default_max_source_chars(),
            unified_override_types: default_unified_override_types(),
            unified_override_max_words: default_unified_override_max_words(),
            min_split_words: default_min_split_words(),
            metrics_capacity: default_metrics_capacity(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            database: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    engine: Option<EngineSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            engine: EngineSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `DOCFORGE_WORKSPACE`: Override workspace path
    /// - `DOCFORGE_CONFIG`: Path to config file
    /// - `DOCFORGE_PROVIDER`: LLM provider
    /// - `DOCFORGE_MODEL`: Model identifier
    /// - `DOCFORGE_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docforge_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("DOCFORGE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("DOCFORGE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.workspace.join(".docforge/config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("DOCFORGE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("DOCFORGE_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("DOCFORGE_API_KEY").ok();
        config.log_level = std::env::var("RUST_LOG").ok().or(config.log_level);

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        if let Some(engine) = config_file.engine {
            result.engine = engine;
        }

        Ok(result)
    }

    /// Apply host overrides to the configuration.
    ///
    /// Overrides take precedence over both the config file and the
    /// environment.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        self
    }

    /// Get the path to the .docforge directory.
    pub fn docforge_dir(&self) -> PathBuf {
        self.workspace.join(".docforge")
    }

    /// Ensure the .docforge directory exists.
    pub fn ensure_docforge_dir(&self) -> AppResult<()> {
        let dir = self.docforge_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .docforge directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Resolved path of the SQLite document library, if one is configured.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.engine
            .database
            .as_ref()
            .map(|db| self.docforge_dir().join(db))
    }

    /// Get the configuration for a provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Providers to try after the active one, in order.
    pub fn fallback_providers(&self) -> Vec<String> {
        self.llm
            .as_ref()
            .map(|llm| llm.fallback_providers.clone())
            .unwrap_or_default()
    }

    /// Resolve API key from environment variable.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        // Explicit DOCFORGE_API_KEY applies to the active provider only
        if provider == self.provider {
            if let Some(ref key) = self.api_key {
                return Some(key.clone());
            }
        }

        match self.get_provider_config(provider)? {
            ProviderConfig::OpenAI { api_key_env, .. } => std::env::var(api_key_env).ok(),
            ProviderConfig::Ollama { .. } => None,
        }
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["openai", "ollama"];

        for provider in std::iter::once(&self.provider).chain(self.fallback_providers().iter()) {
            if !known_providers.contains(&provider.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown provider: {}. Supported: {}",
                    provider,
                    known_providers.join(", ")
                )));
            }
        }

        if let Some(ProviderConfig::OpenAI { api_key_env, .. }) =
            self.get_provider_config(&self.provider)
        {
            if self.api_key.is_none() && std::env::var(api_key_env).is_err() {
                return Err(AppError::Config(format!(
                    "API key not found in environment variable: {}",
                    api_key_env
                )));
            }
        }

        if self.engine.max_source_chars == 0 {
            return Err(AppError::Config(
                "engine.maxSourceChars must be greater than zero".to_string(),
            ));
        }

        if self.engine.metrics_capacity == 0 {
            return Err(AppError::Config(
                "engine.metricsCapacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
