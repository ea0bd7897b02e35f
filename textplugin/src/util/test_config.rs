// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use crate::config::{
    AdminConfig, LoggingConfig, PermissionsConfig, RenderingConfig, SecurityConfig, ServerConfig,
    ValidatedConfig,
};

pub const TEST_SECRET_KEY: &str = "test-secret-test-secret-test-secret";

#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: ValidatedConfig,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    /// `admin` is an editor, `contributor` may only add.
    pub fn new() -> Self {
        Self {
            config: ValidatedConfig {
                server: ServerConfig {
                    host: "127.0.0.1".to_string(),
                    port: 5466,
                    workers: 1,
                },
                admin: AdminConfig {
                    path: "/admin".to_string(),
                },
                security: SecurityConfig {
                    secret_key: TEST_SECRET_KEY.to_string(),
                    session_cookie: "sessionid".to_string(),
                    user_header: "X-Editor-User".to_string(),
                },
                permissions: PermissionsConfig {
                    editors: vec!["admin".to_string()],
                    contributors: vec!["contributor".to_string()],
                },
                rendering: RenderingConfig::default(),
                snapshot_path: None,
                logging: LoggingConfig::default(),
            },
        }
    }

    pub fn with_admin_path(mut self, path: &str) -> Self {
        self.config.admin.path = path.to_string();
        self
    }

    pub fn with_preview_disabled_text(mut self, text: &str) -> Self {
        self.config.rendering.preview_disabled_text = text.to_string();
        self
    }

    pub fn with_editors(mut self, editors: &[&str]) -> Self {
        self.config.permissions.editors = editors.iter().map(|user| user.to_string()).collect();
        self
    }

    pub fn build(self) -> ValidatedConfig {
        self.config
    }
}

pub fn test_config() -> ValidatedConfig {
    TestConfigBuilder::new().build()
}
