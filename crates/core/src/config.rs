//! Configuration management for docqa.
//!
//! Settings are loaded once by the entry point and passed by reference to
//! every component. Sources, lowest precedence first:
//! - Built-in defaults
//! - Config file (`.docqa/config.yaml` or `DOCQA_CONFIG`)
//! - Environment variables
//! - Command-line flags

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::provider::ProviderKind;

pub const WORKSPACE_ENV: &str = "DOCQA_WORKSPACE";
pub const CONFIG_ENV: &str = "DOCQA_CONFIG";
pub const EMBEDDINGS_PROVIDER_ENV: &str = "EMBEDDINGS_PROVIDER";
pub const OPENAI_EMBEDDING_MODEL_ENV: &str = "OPENAI_EMBEDDING_MODEL";
pub const GOOGLE_EMBEDDING_MODEL_ENV: &str = "GOOGLE_EMBEDDING_MODEL";
pub const OFFLINE_EMBEDDING_SIZE_ENV: &str = "FAKE_EMBEDDING_SIZE";
pub const LLM_PROVIDER_ENV: &str = "LLM_PROVIDER";
pub const SOURCE_PATH_ENV: &str = "PDF_PATH";
pub const STORE_FALLBACK_HOST_ENV: &str = "VECTOR_STORE_FALLBACK_HOST";

/// Checked in order; the first non-empty value wins.
pub const STORE_URL_ENVS: [&str; 3] = ["VECTOR_STORE_URL", "LANCEDB_URI", "DATABASE_URL"];

/// Checked in order; the first non-empty value wins.
pub const COLLECTION_ENVS: [&str; 2] = ["VECTOR_COLLECTION", "COLLECTION_NAME"];

pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_GOOGLE_EMBEDDING_MODEL: &str = "models/embedding-001";
pub const DEFAULT_OFFLINE_EMBEDDING_SIZE: usize = 1536;
pub const DEFAULT_COLLECTION: &str = "documents";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Workspace root (contains .docqa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// Google API key
    pub google_api_key: Option<String>,

    /// Embedding provider override ("openai", "google", "fake")
    pub embeddings_provider: Option<String>,

    pub openai_embedding_model: String,

    pub google_embedding_model: String,

    /// Dimension of the offline pseudo-embeddings
    pub offline_embedding_dim: usize,

    /// Preferred language-model provider, tried first in the fallback chain
    pub llm_provider: Option<String>,

    /// Default document to ingest
    pub source_path: Option<PathBuf>,

    /// Vector store connection string (LanceDB URI or local path)
    pub store_url: Option<String>,

    /// Host substituted into the connection string when DNS fails
    pub store_fallback_host: Option<String>,

    /// Collection (table) holding the chunks
    pub collection_name: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    embeddings: Option<EmbeddingsSection>,
    llm: Option<LlmSection>,
    store: Option<StoreSection>,
    source: Option<SourceSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingsSection {
    provider: Option<String>,
    openai_model: Option<String>,
    google_model: Option<String>,
    offline_dimensions: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmSection {
    provider: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreSection {
    url: Option<String>,
    fallback_host: Option<String>,
    collection: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SourceSection {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            openai_api_key: None,
            google_api_key: None,
            embeddings_provider: None,
            openai_embedding_model: DEFAULT_OPENAI_EMBEDDING_MODEL.to_string(),
            google_embedding_model: DEFAULT_GOOGLE_EMBEDDING_MODEL.to_string(),
            offline_embedding_dim: DEFAULT_OFFLINE_EMBEDDING_SIZE,
            llm_provider: None,
            source_path: None,
            store_url: None,
            store_fallback_host: None,
            collection_name: DEFAULT_COLLECTION.to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// `workspace` and `config_file` come from the command line and take
    /// precedence over `DOCQA_WORKSPACE` / `DOCQA_CONFIG`.
    ///
    /// # Example
    /// ```no_run
    /// use docqa_core::config::Settings;
    ///
    /// let settings = Settings::load(None, None).expect("Failed to load settings");
    /// println!("Collection: {}", settings.collection_name);
    /// ```
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        Self::from_lookup(workspace, config_file, |key| std::env::var(key).ok())
    }

    /// Load settings reading variables through `lookup` instead of the
    /// process environment.
    pub fn from_lookup<F>(
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        lookup: F,
    ) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        let workspace =
            workspace.or_else(|| first_non_empty(&lookup, &[WORKSPACE_ENV]).map(PathBuf::from));
        if let Some(workspace) = workspace {
            settings.workspace = workspace;
        }

        settings.config_file =
            config_file.or_else(|| first_non_empty(&lookup, &[CONFIG_ENV]).map(PathBuf::from));

        if !settings.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                settings.workspace
            )));
        }

        let config_path = settings
            .config_file
            .clone()
            .unwrap_or_else(|| settings.docqa_dir().join("config.yaml"));

        if config_path.exists() {
            settings.merge_yaml(&config_path)?;
        } else if settings.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        settings.merge_env(&lookup)?;

        Ok(settings)
    }

    /// Merge a YAML configuration file into these settings.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(embeddings) = file.embeddings {
            if embeddings.provider.is_some() {
                self.embeddings_provider = embeddings.provider;
            }
            if let Some(model) = embeddings.openai_model {
                self.openai_embedding_model = model;
            }
            if let Some(model) = embeddings.google_model {
                self.google_embedding_model = model;
            }
            if let Some(dim) = embeddings.offline_dimensions {
                self.offline_embedding_dim = validate_dimension(dim)?;
            }
        }

        if let Some(llm) = file.llm {
            if llm.provider.is_some() {
                self.llm_provider = llm.provider;
            }
        }

        if let Some(store) = file.store {
            if store.url.is_some() {
                self.store_url = store.url;
            }
            if store.fallback_host.is_some() {
                self.store_fallback_host = store.fallback_host;
            }
            if let Some(collection) = store.collection {
                self.collection_name = collection;
            }
        }

        if let Some(source) = file.source {
            if source.path.is_some() {
                self.source_path = source.path;
            }
        }

        if let Some(logging) = file.logging {
            if logging.level.is_some() {
                self.log_level = logging.level;
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(())
    }

    /// Environment variables override the config file.
    fn merge_env<F>(&mut self, lookup: &F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.openai_api_key = first_non_empty(lookup, &["OPENAI_API_KEY"]);
        self.google_api_key = first_non_empty(lookup, &["GOOGLE_API_KEY"]);

        if let Some(provider) = first_non_empty(lookup, &[EMBEDDINGS_PROVIDER_ENV]) {
            self.embeddings_provider = Some(provider);
        }
        if let Some(model) = first_non_empty(lookup, &[OPENAI_EMBEDDING_MODEL_ENV]) {
            self.openai_embedding_model = model;
        }
        if let Some(model) = first_non_empty(lookup, &[GOOGLE_EMBEDDING_MODEL_ENV]) {
            self.google_embedding_model = model;
        }
        if let Some(size) = first_non_empty(lookup, &[OFFLINE_EMBEDDING_SIZE_ENV]) {
            let dim = size.trim().parse::<usize>().map_err(|e| {
                AppError::Config(format!(
                    "{} must be a positive integer, got '{}': {}",
                    OFFLINE_EMBEDDING_SIZE_ENV, size, e
                ))
            })?;
            self.offline_embedding_dim = validate_dimension(dim)?;
        }
        if let Some(provider) = first_non_empty(lookup, &[LLM_PROVIDER_ENV]) {
            self.llm_provider = Some(provider);
        }
        if let Some(path) = first_non_empty(lookup, &[SOURCE_PATH_ENV]) {
            self.source_path = Some(PathBuf::from(path));
        }
        if let Some(url) = first_non_empty(lookup, &STORE_URL_ENVS) {
            self.store_url = Some(url);
        }
        if let Some(host) = first_non_empty(lookup, &[STORE_FALLBACK_HOST_ENV]) {
            self.store_fallback_host = Some(host);
        }
        if let Some(collection) = first_non_empty(lookup, &COLLECTION_ENVS) {
            self.collection_name = collection;
        }
        if let Some(level) = first_non_empty(lookup, &["RUST_LOG"]) {
            self.log_level = Some(level);
        }
        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply logging-related CLI overrides.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
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

    /// Get the path to the .docqa directory.
    pub fn docqa_dir(&self) -> PathBuf {
        self.workspace.join(".docqa")
    }

    /// Ensure the .docqa directory exists.
    pub fn ensure_docqa_dir(&self) -> AppResult<()> {
        let dir = self.docqa_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .docqa directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Connection string for the vector store.
    ///
    /// Falls back to a LanceDB directory inside `.docqa/`.
    pub fn store_url(&self) -> String {
        self.store_url
            .clone()
            .unwrap_or_else(|| self.docqa_dir().join("lancedb").to_string_lossy().to_string())
    }

    /// Credential configured for `provider`.
    pub fn credential(&self, provider: ProviderKind) -> Option<&str> {
        match provider {
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::Google => self.google_api_key.as_deref(),
            ProviderKind::Offline => None,
        }
    }
}

/// First variable among `names` holding a non-blank value.
pub fn first_non_empty<F>(lookup: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}

fn validate_dimension(dim: usize) -> AppResult<usize> {
    if dim == 0 {
        return Err(AppError::Config(
            "Offline embedding dimension must be greater than zero".to_string(),
        ));
    }
    Ok(dim)
}
