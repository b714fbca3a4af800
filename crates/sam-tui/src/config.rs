// Configuration loading and parsing (config/playground.toml plus environment
// overrides for the backend addresses).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::protocol::{CreatePage, Page};

/// Environment variables naming the backend base URL, in priority order.
pub const BASE_URL_VARS: &[&str] = &["SAM_BE_URL", "BE_URL"];

/// Environment variable naming the legacy upload endpoint.
pub const UPLOAD_URL_VAR: &str = "SAM_UPLOAD_URL";

const CONFIG_FILE: &str = "playground.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Root of the market service, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Full address of the legacy single-file upload endpoint.
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    /// Which form the Create page shows.
    #[serde(default)]
    pub create_page: CreatePage,
    /// Page shown at startup.
    #[serde(default = "default_start_page")]
    pub start_page: Page,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            create_page: CreatePage::default(),
            start_page: default_start_page(),
        }
    }
}

fn default_upload_url() -> String {
    "http://localhost:8080/upload".to_string()
}

fn default_start_page() -> Page {
    Page::Chat
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/playground.toml` relative to `base_dir`,
/// applying overrides from `env`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
pub(crate) fn load_config_from(
    base_dir: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let mut config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    apply_env_overrides(&mut config, env);
    normalize(&mut config);
    validate(&config)?;

    Ok(config)
}

/// Replace backend addresses with values from the environment, when set.
fn apply_env_overrides(config: &mut Config, env: impl Fn(&str) -> Option<String>) {
    let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = BASE_URL_VARS.iter().find_map(|name| non_empty(name)) {
        config.backend.base_url = url;
    }
    if let Some(url) = non_empty(UPLOAD_URL_VAR) {
        config.backend.upload_url = url;
    }
}

fn normalize(config: &mut Config) {
    config.backend.base_url = config.backend.base_url.trim().trim_end_matches('/').to_string();
    config.backend.upload_url = config.backend.upload_url.trim().to_string();
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the crate root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working
/// directory with overrides from the process environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd, |name| std::env::var(name).ok())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_url("backend.base_url", &config.backend.base_url)?;
    validate_url("backend.upload_url", &config.backend.upload_url)?;
    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(value).map_err(|e| ConfigError::ValidationError {
        field: field.to_string(),
        message: format!("`{value}` is not a valid URL: {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::ValidationError {
            field: field.to_string(),
            message: format!("scheme must be http or https, got `{other}`"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
