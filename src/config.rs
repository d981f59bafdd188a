use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::DEFAULT_API_URL;
use crate::models::Identity;

const APP_DIR: &str = "insightqa";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

pub const CONFIG_ENV: &str = "INSIGHTQA_CONFIG";
pub const API_URL_ENV: &str = "INSIGHTQA_API_URL";
pub const TOKEN_ENV: &str = "INSIGHTQA_TOKEN";
pub const EMAIL_ENV: &str = "INSIGHTQA_EMAIL";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("timeout_secs must be greater than zero")]
    ZeroTimeout,
    #[error(
        "Not authenticated: set token and email in {} or {} / {}",
        .path.display(),
        TOKEN_ENV,
        EMAIL_ENV
    )]
    NotAuthenticated { path: PathBuf },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct IdentitySettings {
    pub token: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub timeout_secs: u64,
    pub export_dir: Option<PathBuf>,
    pub identity: IdentitySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            export_dir: None,
            identity: IdentitySettings::default(),
        }
    }
}

/// Effective settings plus the file they were read from.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub path: PathBuf,
    pub settings: Settings,
}

pub fn settings_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE_NAME)
}

/// Directory for the TUI log file.
pub fn data_dir() -> PathBuf {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&dir).ok();
    dir
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Settings {
    pub fn from_toml(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(raw) => {
                let settings = Self::from_toml(path, &raw)?;
                info!(target: "insightqa::config", path = %path.display(), "loaded settings");
                Ok(settings)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(target: "insightqa::config", path = %path.display(), "no settings file; using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Applies `INSIGHTQA_*` overrides through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = non_empty(lookup(API_URL_ENV)) {
            self.api_url = url;
        }
        if let Some(token) = non_empty(lookup(TOKEN_ENV)) {
            self.identity.token = Some(token);
        }
        if let Some(email) = non_empty(lookup(EMAIL_ENV)) {
            self.identity.email = Some(email);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Both token and email must be present and non-blank.
    pub fn identity(&self) -> Option<Identity> {
        let token = non_empty(self.identity.token.clone())?;
        let email = non_empty(self.identity.email.clone())?;
        Some(Identity::new(token, email))
    }

    /// Copy safe to print: the token is masked.
    pub fn redacted(&self) -> Settings {
        let mut copy = self.clone();
        if copy.identity.token.is_some() {
            copy.identity.token = Some("********".to_string());
        }
        copy
    }
}

impl LoadedSettings {
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = settings_path(explicit);
        let mut settings = Settings::read(&path)?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(Self { path, settings })
    }

    pub fn require_identity(&self) -> Result<Identity, ConfigError> {
        self.settings
            .identity()
            .ok_or_else(|| ConfigError::NotAuthenticated {
                path: self.path.clone(),
            })
    }
}
