// Configuration loading and parsing (league.toml, service.toml).

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::naming::{Environment, League, LeagueNaming};

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

    #[error("failed to create database directory {path}: {message}")]
    DataDirError { path: PathBuf, message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub listener_port: u16,
    pub db_path: PathBuf,
    /// When set, events are replayed from this JSON-lines file instead of
    /// being received over the listener.
    pub replay_path: Option<PathBuf>,
}

impl Config {
    pub fn naming(&self) -> LeagueNaming {
        self.league.naming()
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    /// `major` or `minor`.
    #[serde(default)]
    pub kind: League,
    /// `production` or `development`.
    #[serde(default)]
    pub environment: Environment,
}

impl LeagueConfig {
    pub fn naming(&self) -> LeagueNaming {
        LeagueNaming::new(self.kind, self.environment)
    }
}

// ---------------------------------------------------------------------------
// service.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ServiceFile {
    listener: ListenerSection,
    database: DatabaseSection,
    #[serde(default)]
    replay: ReplaySection,
}

#[derive(Debug, Clone, Deserialize)]
struct ListenerSection {
    port: u16,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    /// Empty means the platform data directory.
    #[serde(default)]
    path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ReplaySection {
    #[serde(default)]
    path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/service.toml` relative to `base_dir`.
///
/// This does not copy defaults; prefer `load_config()` for startup.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    let service_path = config_dir.join("service.toml");
    let service_text = read_file(&service_path)?;
    let service_file: ServiceFile =
        toml::from_str(&service_text).map_err(|e| ConfigError::ParseError {
            path: service_path.clone(),
            source: e,
        })?;

    let replay_path = Some(service_file.replay.path.trim())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);

    let config = Config {
        league: league_file.league,
        listener_port: service_file.listener.port,
        db_path: resolve_db_path(&service_file.database.path)?,
        replay_path,
    };

    validate(&config)?;

    Ok(config)
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
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
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
        if target.exists() {
            continue;
        }
        std::fs::copy(&path, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", path.display(), target.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

/// Create the directory the database file lives in. In-memory databases and
/// bare file names in the working directory need nothing.
pub fn prepare_db_dir(db_path: &Path) -> Result<(), ConfigError> {
    if db_path == Path::new(":memory:") {
        return Ok(());
    }
    match db_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::DataDirError {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// An empty database path resolves to `rkl.db` in the platform data dir.
fn resolve_db_path(raw: &str) -> Result<PathBuf, ConfigError> {
    let raw = raw.trim();
    if !raw.is_empty() {
        return Ok(PathBuf::from(raw));
    }
    let dirs = ProjectDirs::from("org", "rkl", "rkl-service").ok_or_else(|| {
        ConfigError::ValidationError {
            field: "database.path".into(),
            message: "empty and no platform data directory is available".into(),
        }
    })?;
    Ok(dirs.data_dir().join("rkl.db"))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.name".into(),
            message: "must not be empty".into(),
        });
    }

    if config.listener_port == 0 {
        return Err(ConfigError::ValidationError {
            field: "listener.port".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
