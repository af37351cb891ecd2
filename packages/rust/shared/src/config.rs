//! Application configuration for ContentFlow.
//!
//! User config lives at `~/.contentflow/contentflow.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored in the file, only the names of the environment
//! variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ContentFlowError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contentflow.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contentflow";

// ---------------------------------------------------------------------------
// Config structs (matching contentflow.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Service key settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Supabase (PostgREST) connection settings.
    #[serde(default)]
    pub supabase: SupabaseConfig,

    /// Which content store backs the pipeline.
    #[serde(default)]
    pub store: StoreConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".into()
}

/// `[auth]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Name of the env var holding the `x-api-key` value.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_api_key_env() -> String {
    "AGENTS_KEY".into()
}

/// `[supabase]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Name of the env var holding the project URL.
    #[serde(default = "default_url_env")]
    pub url_env: String,

    /// Name of the env var holding the service-role key.
    #[serde(default = "default_service_role_env")]
    pub service_role_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url_env: default_url_env(),
            service_role_env: default_service_role_env(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_url_env() -> String {
    "SUPABASE_URL".into()
}
fn default_service_role_env() -> String {
    "SUPABASE_SERVICE_ROLE".into()
}
fn default_timeout() -> u64 {
    30
}

/// Content store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Remote Supabase project via PostgREST.
    #[default]
    Supabase,
    /// Embedded libSQL file, for offline use.
    Local,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database file used by the local backend.
    #[serde(default = "default_local_path")]
    pub local_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            local_path: default_local_path(),
        }
    }
}

fn default_local_path() -> String {
    "var/contentflow.db".into()
}

// ---------------------------------------------------------------------------
// Resolved secrets
// ---------------------------------------------------------------------------

/// Supabase endpoint and key, resolved from the environment.
#[derive(Clone)]
pub struct SupabaseCredentials {
    /// Project base URL (e.g. `https://xyz.supabase.co`).
    pub url: Url,
    /// Service-role key, sent as both `apikey` and bearer token.
    pub service_role: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for SupabaseCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseCredentials")
            .field("url", &self.url.as_str())
            .field("service_role", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Resolve the service key from the process environment.
///
/// Returns `None` when the variable is unset or empty; the server then
/// rejects every keyed request.
pub fn resolve_api_key(config: &AppConfig) -> Option<String> {
    resolve_api_key_with(config, |name| std::env::var(name).ok())
}

/// Like [`resolve_api_key`], with an explicit variable lookup.
pub fn resolve_api_key_with(
    config: &AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    lookup(&config.auth.api_key_env).filter(|key| !key.is_empty())
}

/// Resolve Supabase credentials from the process environment.
pub fn resolve_supabase(config: &AppConfig) -> Result<SupabaseCredentials> {
    resolve_supabase_with(config, |name| std::env::var(name).ok())
}

/// Like [`resolve_supabase`], with an explicit variable lookup.
pub fn resolve_supabase_with(
    config: &AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SupabaseCredentials> {
    let url_env = &config.supabase.url_env;
    let key_env = &config.supabase.service_role_env;

    let url = lookup(url_env).filter(|v| !v.is_empty());
    let key = lookup(key_env).filter(|v| !v.is_empty());

    let (Some(url), Some(service_role)) = (url, key) else {
        return Err(ContentFlowError::config(format!(
            "Missing {url_env} or {key_env} in environment"
        )));
    };

    let url = Url::parse(&url)
        .map_err(|e| ContentFlowError::config(format!("{url_env} is not a valid URL: {e}")))?;

    Ok(SupabaseCredentials {
        url,
        service_role,
        timeout_secs: config.supabase.timeout_secs,
    })
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contentflow/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContentFlowError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contentflow/contentflow.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| ContentFlowError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ContentFlowError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContentFlowError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContentFlowError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContentFlowError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
