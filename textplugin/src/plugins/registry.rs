// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::fragments::Fragment;
use crate::render::RenderContext;
use crate::util::html_escape;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_PREVIEW_DISABLED_TEXT: &str = "Preview is disabled for this plugin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for RenderError {}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        RenderError::new(format!("Template error: {}", err))
    }
}

/// Type-specific behaviour of a child plugin.
pub trait PluginRenderer: Send + Sync {
    /// Human readable type name, the first half of a tag label.
    fn name(&self) -> &str;

    fn render(&self, fragment: &Fragment, ctx: &RenderContext<'_>) -> Result<String, RenderError>;

    /// Whether the editor may show a live preview of this plugin.
    fn text_editor_preview(&self) -> bool {
        true
    }

    /// Instance description, the second half of a tag label.
    fn describe(&self, fragment: &Fragment) -> String {
        fragment.id.to_string()
    }

    /// Text sent out for translation; `None` marks the type untranslatable.
    fn translatable_content(&self, _fragment: &Fragment) -> Option<String> {
        None
    }
}

/// Registry of renderers keyed by plugin type.
pub struct PluginRegistry {
    renderers: HashMap<String, Arc<dyn PluginRenderer>>,
    preview_disabled_text: String,
}

impl PluginRegistry {
    pub fn new(preview_disabled_text: &str) -> Self {
        Self {
            renderers: HashMap::new(),
            preview_disabled_text: preview_disabled_text.to_string(),
        }
    }

    /// Register a renderer, replacing any previous one for `plugin_type`.
    pub fn register(&mut self, plugin_type: &str, renderer: Arc<dyn PluginRenderer>) {
        log::debug!("Registering plugin renderer '{}'", plugin_type);
        self.renderers.insert(plugin_type.to_string(), renderer);
    }

    pub fn get(&self, plugin_type: &str) -> Option<&Arc<dyn PluginRenderer>> {
        self.renderers.get(plugin_type)
    }

    /// Return a sorted list of registered plugin types.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.renderers.keys().cloned().collect();
        names.sort();
        names
    }

    /// `"{type name} - {description}"`; unknown types fall back to the raw type.
    pub fn label(&self, fragment: &Fragment) -> String {
        match self.get(&fragment.plugin_type) {
            Some(renderer) => format!("{} - {}", renderer.name(), renderer.describe(fragment)),
            None => format!("{} - {}", fragment.plugin_type, fragment.id),
        }
    }

    /// Unknown types never preview.
    pub fn preview_enabled(&self, fragment: &Fragment) -> bool {
        self.get(&fragment.plugin_type)
            .map(|renderer| renderer.text_editor_preview())
            .unwrap_or(false)
    }

    /// Content of a tag whose preview is disabled.
    pub fn disabled_marker(&self) -> String {
        format!("<span>{}</span>", html_escape(&self.preview_disabled_text))
    }

    pub fn render(&self, fragment: &Fragment, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let renderer = self.get(&fragment.plugin_type).ok_or_else(|| {
            RenderError::new(format!("No renderer for plugin type '{}'", fragment.plugin_type))
        })?;
        renderer.render(fragment, ctx)
    }

    pub fn translatable_content(&self, fragment: &Fragment) -> Option<String> {
        self.get(&fragment.plugin_type)
            .and_then(|renderer| renderer.translatable_content(fragment))
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_DISABLED_TEXT)
    }
}
