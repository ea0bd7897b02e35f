// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;

use crate::actions::TextActions;
use crate::admin::identity::{HeaderIdentityProvider, IdentityProvider};
use crate::config::{ConfigError, ValidatedConfig};
use crate::fragments::FragmentStore;
use crate::permissions::{ConfiguredPermissions, PermissionChecker};
use crate::plugins::{PluginRegistry, register_builtin};
use crate::sanitizer::HtmlSanitizer;
use crate::templates::{MiniJinjaEngine, TemplateEngine};
use crate::token::ActionTokens;

pub struct AppState {
    pub html_sanitizer: HtmlSanitizer,
    pub store: Arc<dyn FragmentStore>,
    pub registry: PluginRegistry,
    pub tokens: ActionTokens,
    pub permissions: Arc<dyn PermissionChecker>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Wire the default collaborators: built-in plugins, config-driven
    /// permissions and header/cookie identity.
    pub fn new(config: &ValidatedConfig, store: Arc<dyn FragmentStore>) -> Result<Self, ConfigError> {
        let templates: Arc<dyn TemplateEngine> = Arc::new(MiniJinjaEngine::new());
        let mut registry = PluginRegistry::new(&config.rendering.preview_disabled_text);
        register_builtin(&mut registry, templates);

        let tokens = ActionTokens::new(config.security.secret_key.as_bytes()).map_err(|e| {
            ConfigError::ValidationError(format!("Unusable security.secret_key: {}", e))
        })?;

        Ok(Self {
            html_sanitizer: HtmlSanitizer::new(),
            store,
            registry,
            tokens,
            permissions: Arc::new(ConfiguredPermissions::new(&config.permissions)),
            identity: Arc::new(HeaderIdentityProvider::new(&config.security)),
        })
    }

    pub fn actions(&self) -> TextActions<'_> {
        TextActions::new(self.store.as_ref(), &self.registry, &self.tokens)
    }
}
