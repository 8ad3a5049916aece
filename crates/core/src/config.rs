//! Configuration management for the catalog Q&A service.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (`.catalog/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with all state stored in `.catalog/`.
//! It is loaded once at process start and passed by reference to whatever
//! needs it; nothing here is global.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 1] = ["ollama"];

/// Embedding providers the knowledge crate knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["ollama", "trigram"];

const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .catalog/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Chat provider (currently "ollama")
    pub provider: String,

    /// Chat model identifier
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

    /// Retrieval settings
    pub retrieval: RetrievalSettings,

    /// Session memory retention
    pub sessions: SessionSettings,

    /// Webhook receiving `{session_id, answer}` after each query
    pub callback_url: Option<String>,

    /// HTTP server settings
    pub server: ServerSettings,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(rename = "activeEmbeddingProvider")]
    pub active_embedding_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration (Ollama-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub endpoint: String,

    pub model: String,

    #[serde(rename = "embeddingModel")]
    pub embedding_model: Option<String>,

    #[serde(rename = "embeddingDimensions")]
    pub embedding_dimensions: Option<usize>,

    /// Request timeout in seconds
    pub timeout: Option<u64>,
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Passages fetched per tool call
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: usize,

    /// Name of the persisted index under `.catalog/index/`
    #[serde(rename = "indexName", default = "default_index_name")]
    pub index_name: String,

    /// Directory of source documents used by `index build`
    #[serde(rename = "docsDir", default = "default_docs_dir")]
    pub docs_dir: PathBuf,
}

/// Session retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(rename = "maxSessions", default = "default_max_sessions")]
    pub max_sessions: u64,

    #[serde(rename = "idleTimeoutSecs", default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_top_k() -> usize {
    3
}

fn default_index_name() -> String {
    "catalog".to_string()
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}

fn default_max_sessions() -> u64 {
    10_000
}

fn default_idle_timeout_secs() -> u64 {
    3600
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            index_name: default_index_name(),
            docs_dir: default_docs_dir(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    retrieval: Option<RetrievalSettings>,
    sessions: Option<SessionSettings>,
    callback: Option<CallbackConfig>,
    server: Option<ServerSettings>,
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

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CallbackConfig {
    url: Option<String>,
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
            retrieval: RetrievalSettings::default(),
            sessions: SessionSettings::default(),
            callback_url: None,
            server: ServerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `CATALOG_WORKSPACE`: Override workspace path
    /// - `CATALOG_CONFIG`: Path to config file
    /// - `CATALOG_PROVIDER`: LLM provider
    /// - `CATALOG_MODEL`: Chat model identifier
    /// - `CATALOG_API_KEY`: API key
    /// - `CATALOG_TOP_K`: Passages retrieved per tool call
    /// - `CATALOG_CALLBACK_URL`: Answer webhook
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use catalog_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let workspace = std::env::var("CATALOG_WORKSPACE").ok().map(PathBuf::from);
        let config_file = std::env::var("CATALOG_CONFIG").ok().map(PathBuf::from);
        Self::load_with(workspace, config_file)
    }

    /// Load configuration for an explicit workspace and config file.
    ///
    /// `None` falls back to the current directory and
    /// `<workspace>/.catalog/config.yaml` respectively.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }
        config.config_file = config_file;

        // Validate workspace exists
        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.workspace.join(".catalog/config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("CATALOG_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("CATALOG_MODEL") {
            config.model = model;
        }

        if let Ok(top_k) = std::env::var("CATALOG_TOP_K") {
            config.retrieval.top_k = top_k.parse().map_err(|_| {
                AppError::Config(format!("CATALOG_TOP_K must be a positive integer, got {:?}", top_k))
            })?;
        }

        if let Ok(url) = std::env::var("CATALOG_CALLBACK_URL") {
            config.callback_url = Some(url);
        }

        config.api_key = std::env::var("CATALOG_API_KEY").ok();
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

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

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
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
                result.model = provider_config.model.clone();
            }

            result.llm = Some(llm);
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(sessions) = config_file.sessions {
            result.sessions = sessions;
        }

        if let Some(url) = config_file.callback.and_then(|cb| cb.url) {
            result.callback_url = Some(url);
        }

        if let Some(server) = config_file.server {
            result.server = server;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and YAML.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
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

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .catalog directory.
    pub fn catalog_dir(&self) -> PathBuf {
        self.workspace.join(".catalog")
    }

    /// Ensure the .catalog directory exists.
    pub fn ensure_catalog_dir(&self) -> AppResult<()> {
        let catalog_dir = self.catalog_dir();
        if !catalog_dir.exists() {
            std::fs::create_dir_all(&catalog_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .catalog directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Documents directory, resolved against the workspace when relative.
    pub fn docs_dir(&self) -> PathBuf {
        if self.retrieval.docs_dir.is_absolute() {
            self.retrieval.docs_dir.clone()
        } else {
            self.workspace.join(&self.retrieval.docs_dir)
        }
    }

    /// Get the configuration for a named provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint of the active chat provider.
    pub fn endpoint(&self) -> String {
        self.get_provider_config(&self.provider)
            .map(|pc| pc.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_OLLAMA_ENDPOINT.to_string())
    }

    /// Request timeout of the active chat provider, in seconds.
    pub fn timeout_secs(&self) -> Option<u64> {
        self.get_provider_config(&self.provider)
            .and_then(|pc| pc.timeout)
    }

    /// Name of the embedding provider used when building an index.
    pub fn embedding_provider(&self) -> String {
        self.llm
            .as_ref()
            .map(|llm| llm.active_embedding_provider.clone())
            .unwrap_or_else(|| "ollama".to_string())
    }

    /// Endpoint, model and dimensions configured for the embedding provider.
    pub fn embedding_settings(&self) -> (String, Option<String>, Option<usize>) {
        let provider = self.embedding_provider();
        match self.get_provider_config(&provider) {
            Some(pc) => (
                pc.endpoint.clone(),
                pc.embedding_model.clone(),
                pc.embedding_dimensions,
            ),
            None => (DEFAULT_OLLAMA_ENDPOINT.to_string(), None, None),
        }
    }

    /// Resolve the API key for the active provider.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone()
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        let embedding_provider = self.embedding_provider();
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be at least 1".to_string(),
            ));
        }

        if self.sessions.max_sessions == 0 {
            return Err(AppError::Config(
                "sessions.maxSessions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.index_name, "catalog");
        assert!(config.callback_url.is_none());
        assert!(!config.verbose);
    }

    #[test]
    fn test_catalog_dir() {
        let config = AppConfig::default();
        assert!(config.catalog_dir().ends_with(".catalog"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some("ollama".to_string()),
            Some("qwen2.5".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.model, "qwen2.5");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  activeProvider: ollama
  activeEmbeddingProvider: trigram
  providers:
    ollama:
      endpoint: http://gpu-box:11434
      model: llama3.1
      embeddingModel: nomic-embed-text
      timeout: 60
retrieval:
  topK: 5
  indexName: webcams
sessions:
  maxSessions: 50
  idleTimeoutSecs: 120
callback:
  url: http://localhost:9000/hook
"#,
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(config.model, "llama3.1");
        assert_eq!(config.endpoint(), "http://gpu-box:11434");
        assert_eq!(config.timeout_secs(), Some(60));
        assert_eq!(config.embedding_provider(), "trigram");
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.index_name, "webcams");
        assert_eq!(config.retrieval.docs_dir, PathBuf::from("docs"));
        assert_eq!(config.sessions.max_sessions, 50);
        assert_eq!(
            config.callback_url.as_deref(),
            Some("http://localhost:9000/hook")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_with_missing_workspace() {
        let result = AppConfig::load_with(Some(PathBuf::from("/definitely/not/here")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
