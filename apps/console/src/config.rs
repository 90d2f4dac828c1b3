use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use client_core::{transport::DEFAULT_BASE_URL, ClientConfig, Locale};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "console.toml";
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid timeout '{0}' (expected whole seconds greater than zero)")]
    InvalidTimeout(String),
    #[error("{0}")]
    InvalidLocale(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub session_file: PathBuf,
    pub locale: Locale,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            session_file: default_session_file(),
            locale: Locale::default(),
        }
    }
}

impl Settings {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
    session_file: Option<PathBuf>,
    locale: Option<String>,
}

/// Command-line values; any that are set win over file and environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub session_file: Option<PathBuf>,
    pub locale: Option<String>,
}

pub fn load_settings(path: &Path, overrides: &Overrides) -> Result<Settings, ConfigError> {
    load_settings_with(path, overrides, |key| std::env::var(key).ok())
}

/// Defaults, then the optional TOML file, then environment, then `overrides`.
pub fn load_settings_with(
    path: &Path,
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    let file = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<FileSettings>(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => FileSettings::default(),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if let Some(v) = file.base_url {
        settings.base_url = v;
    }
    if let Some(v) = file.timeout_seconds {
        settings.timeout_seconds = v;
    }
    if let Some(v) = file.session_file {
        settings.session_file = v;
    }
    if let Some(v) = file.locale {
        settings.locale = parse_locale(&v)?;
    }

    // Later names win: the web build's variable, then the plain one, then the APP__ one.
    for key in ["NEXT_PUBLIC_BASE_URL", "BASE_URL", "APP__BASE_URL"] {
        if let Some(v) = env(key).filter(|v| !v.trim().is_empty()) {
            settings.base_url = v;
        }
    }
    if let Some(v) = env("APP__TIMEOUT_SECONDS") {
        settings.timeout_seconds = v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidTimeout(v.clone()))?;
    }
    if let Some(v) = env("APP__SESSION_FILE") {
        settings.session_file = PathBuf::from(v);
    }
    if let Some(v) = env("APP__LOCALE") {
        settings.locale = parse_locale(&v)?;
    }

    if let Some(v) = &overrides.base_url {
        settings.base_url = v.clone();
    }
    if let Some(v) = overrides.timeout_seconds {
        settings.timeout_seconds = v;
    }
    if let Some(v) = &overrides.session_file {
        settings.session_file = v.clone();
    }
    if let Some(v) = &overrides.locale {
        settings.locale = parse_locale(v)?;
    }

    if settings.timeout_seconds == 0 {
        return Err(ConfigError::InvalidTimeout("0".into()));
    }
    settings.base_url = settings.base_url.trim().trim_end_matches('/').to_string();
    Ok(settings)
}

fn parse_locale(raw: &str) -> Result<Locale, ConfigError> {
    raw.parse().map_err(ConfigError::InvalidLocale)
}

fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("edu-console").join("session.json"))
        .unwrap_or_else(|| PathBuf::from(".edu-console-session.json"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
