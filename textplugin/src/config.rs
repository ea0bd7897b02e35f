// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::plugins::DEFAULT_PREVIEW_DISABLED_TEXT;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MIN_SECRET_KEY_BYTES: usize = 32;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    2
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    #[serde(default = "default_admin_path")]
    pub path: String,
}

fn default_admin_path() -> String {
    "/admin".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            path: default_admin_path(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    pub secret_key: String,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

fn default_session_cookie() -> String {
    "sessionid".to_string()
}

fn default_user_header() -> String {
    "X-Editor-User".to_string()
}

/// Who may do what in the editor. Editors may add and change text
/// fragments; contributors may only add.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PermissionsConfig {
    #[serde(default)]
    pub editors: Vec<String>,
    #[serde(default)]
    pub contributors: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RenderingConfig {
    #[serde(default = "default_preview_disabled_text")]
    pub preview_disabled_text: String,
}

fn default_preview_disabled_text() -> String {
    DEFAULT_PREVIEW_DISABLED_TEXT.to_string()
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            preview_disabled_text: default_preview_disabled_text(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StorageConfig {
    /// YAML snapshot of the fragment store, relative to the runtime root.
    #[serde(default)]
    pub snapshot_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    pub security: SecurityConfig,
    #[serde(default)]
    pub permissions: PermissionsConfig,
    #[serde(default)]
    pub rendering: RenderingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub security: SecurityConfig,
    pub permissions: PermissionsConfig,
    pub rendering: RenderingConfig,
    /// Absolute snapshot path, resolved against the runtime root.
    pub snapshot_path: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join("config.yaml");
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::parse(&config_content).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            ))
        })
    }

    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Loads and validates configuration at startup. If validation fails, the application should not start.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        Self::load(root)?.validate(root)
    }

    pub fn validate(self, root: &Path) -> Result<ValidatedConfig, ConfigError> {
        let admin_path = &self.admin.path;
        if !admin_path.starts_with('/') || admin_path.len() < 2 || admin_path.ends_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "admin.path must start with '/' and must not end with '/', got: '{}'",
                admin_path
            )));
        }

        if self.security.secret_key.len() < MIN_SECRET_KEY_BYTES {
            return Err(ConfigError::ValidationError(format!(
                "security.secret_key must be at least {} bytes",
                MIN_SECRET_KEY_BYTES
            )));
        }
        if self.security.session_cookie.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "security.session_cookie must not be empty".to_string(),
            ));
        }
        if actix_web::http::header::HeaderName::from_bytes(self.security.user_header.as_bytes())
            .is_err()
        {
            return Err(ConfigError::ValidationError(format!(
                "security.user_header is not a valid header name: '{}'",
                self.security.user_header
            )));
        }

        if self.server.workers == 0 {
            return Err(ConfigError::ValidationError(
                "server.workers must be at least 1".to_string(),
            ));
        }

        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "logging.level must be one of error, warn, info, debug, trace; got: '{}'",
                    other
                )));
            }
        }

        if self.permissions.editors.is_empty() && self.permissions.contributors.is_empty() {
            warn!("No editors or contributors configured; every editor request will be refused");
        }
        for user in &self.permissions.contributors {
            if self.permissions.editors.contains(user) {
                warn!("User '{}' is listed as both editor and contributor", user);
            }
        }

        let snapshot_path = self.storage.snapshot_file.map(|file| {
            if file.is_absolute() {
                file
            } else {
                root.join(file)
            }
        });

        Ok(ValidatedConfig {
            server: self.server,
            admin: self.admin,
            security: self.security,
            permissions: self.permissions,
            rendering: self.rendering,
            snapshot_path,
            logging: self.logging,
        })
    }
}
