//! Application configuration for chemfuse.
//!
//! User config lives at `~/.chemfuse/chemfuse.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ChemFuseError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "chemfuse.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".chemfuse";

// ---------------------------------------------------------------------------
// Config structs (matching chemfuse.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream data provider endpoints.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Request pacing and batch bounds.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the HTTP server binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by the CORS layer.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_port() -> u16 {
    8000
}
fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost".into(),
        "http://localhost:8000".into(),
        "http://127.0.0.1".into(),
        "http://127.0.0.1:8000".into(),
    ]
}

/// `[providers]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Materials-summary provider (REST, keyed).
    #[serde(default = "default_materials_base_url")]
    pub materials_base_url: String,

    /// Formula → registry number results pages (scraped).
    #[serde(default = "default_registry_base_url")]
    pub registry_base_url: String,

    /// Registry number → compound id translation service.
    #[serde(default = "default_translator_base_url")]
    pub translator_base_url: String,

    /// Batched compound-property provider.
    #[serde(default = "default_properties_base_url")]
    pub properties_base_url: String,

    /// Name of the env var holding the materials API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            materials_base_url: default_materials_base_url(),
            registry_base_url: default_registry_base_url(),
            translator_base_url: default_translator_base_url(),
            properties_base_url: default_properties_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_materials_base_url() -> String {
    "https://api.materialsproject.org".into()
}
fn default_registry_base_url() -> String {
    "https://webbook.nist.gov".into()
}
fn default_translator_base_url() -> String {
    "https://cts.fiehnlab.ucdavis.edu".into()
}
fn default_properties_base_url() -> String {
    "https://pubchem.ncbi.nlm.nih.gov".into()
}
fn default_api_key_env() -> String {
    "MP_API_KEY".into()
}

/// `[limits]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum identifiers accepted per aggregation request.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,

    /// Minimum ms between upstream lookups within one request.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_batch: default_max_batch(),
            rate_limit_ms: default_rate_limit(),
        }
    }
}

fn default_max_batch() -> usize {
    5
}
fn default_rate_limit() -> u64 {
    1000
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration consumed by the correlator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum identifiers per aggregation request.
    pub max_batch: usize,
    /// Minimum ms between upstream lookups.
    pub rate_limit_ms: u64,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_batch: config.limits.max_batch,
            rate_limit_ms: config.limits.rate_limit_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.chemfuse/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ChemFuseError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.chemfuse/chemfuse.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ChemFuseError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ChemFuseError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ChemFuseError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ChemFuseError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ChemFuseError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the materials API key from the env var named in config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.providers.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ChemFuseError::config(format!(
            "materials API key not found. Set the {var_name} environment variable."
        ))),
    }
}
