// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::registry::{PluginRegistry, PluginRenderer, RenderError};
use crate::fragments::{Fragment, TEXT_PLUGIN_TYPE};
use crate::render::{RenderContext, render_publish};
use crate::templates::{TemplateEngine, render_minijinja_template};
use minijinja::context;
use std::sync::Arc;

/// Register the plugins shipped with the crate.
pub fn register_builtin(registry: &mut PluginRegistry, engine: Arc<dyn TemplateEngine>) {
    registry.register(TEXT_PLUGIN_TYPE, Arc::new(TextPlugin));
    registry.register("LinkPlugin", Arc::new(LinkPlugin::new(engine.clone())));
    registry.register("PicturePlugin", Arc::new(PicturePlugin::new(engine.clone())));
    registry.register("SpacerPlugin", Arc::new(SpacerPlugin::new(engine)));
}

/// A text fragment nested inside another one.
pub struct TextPlugin;

impl PluginRenderer for TextPlugin {
    fn name(&self) -> &str {
        "Text"
    }

    fn render(&self, fragment: &Fragment, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let inner = ctx
            .nested()
            .ok_or_else(|| RenderError::new("Text fragments nested too deeply"))?;
        render_publish(&fragment.body, &inner).map_err(|err| RenderError::new(err.to_string()))
    }

    fn describe(&self, fragment: &Fragment) -> String {
        let plain = strip_markup(&fragment.body);
        let mut words: Vec<&str> = plain.split_whitespace().take(6).collect();
        if words.is_empty() {
            words.push("empty");
        }
        words.join(" ")
    }
}

pub struct LinkPlugin {
    engine: Arc<dyn TemplateEngine>,
}

impl LinkPlugin {
    pub fn new(engine: Arc<dyn TemplateEngine>) -> Self {
        Self { engine }
    }
}

impl PluginRenderer for LinkPlugin {
    fn name(&self) -> &str {
        "Link"
    }

    fn render(&self, fragment: &Fragment, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let name = fragment.data_str("name").unwrap_or("");
        let href = fragment.data_str("external_link").unwrap_or("");
        if href.is_empty() {
            return Err(RenderError::new("Link plugin has no external_link"));
        }
        if href.trim_start().to_ascii_lowercase().starts_with("javascript:") {
            return Err(RenderError::new("Link plugin refuses javascript: URLs"));
        }
        let target = fragment.data_str("target").filter(|t| !t.is_empty());

        let html = render_minijinja_template(
            self.engine.as_ref(),
            "plugins/link.html",
            context! {
                href => href,
                name => if name.is_empty() { href } else { name },
                target => target,
            },
        )?;
        Ok(html)
    }

    fn describe(&self, fragment: &Fragment) -> String {
        fragment
            .data_str("name")
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fragment.id.to_string())
    }

    fn translatable_content(&self, fragment: &Fragment) -> Option<String> {
        Some(fragment.data_str("name").unwrap_or("").to_string())
    }
}

pub struct PicturePlugin {
    engine: Arc<dyn TemplateEngine>,
}

impl PicturePlugin {
    pub fn new(engine: Arc<dyn TemplateEngine>) -> Self {
        Self { engine }
    }
}

impl PluginRenderer for PicturePlugin {
    fn name(&self) -> &str {
        "Picture"
    }

    fn render(&self, fragment: &Fragment, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let picture = fragment
            .data_str("picture")
            .filter(|p| !p.is_empty())
            .ok_or_else(|| RenderError::new("Picture plugin has no picture"))?;
        let html = render_minijinja_template(
            self.engine.as_ref(),
            "plugins/picture.html",
            context! {
                picture => picture,
                caption_text => fragment.data_str("caption_text").unwrap_or(""),
            },
        )?;
        Ok(html)
    }

    fn describe(&self, fragment: &Fragment) -> String {
        fragment
            .data_str("caption_text")
            .filter(|caption| !caption.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fragment.id.to_string())
    }

    fn translatable_content(&self, fragment: &Fragment) -> Option<String> {
        fragment.data_str("caption_text").map(str::to_string)
    }
}

pub struct SpacerPlugin {
    engine: Arc<dyn TemplateEngine>,
}

impl SpacerPlugin {
    pub fn new(engine: Arc<dyn TemplateEngine>) -> Self {
        Self { engine }
    }
}

impl PluginRenderer for SpacerPlugin {
    fn name(&self) -> &str {
        "Spacer"
    }

    fn render(&self, fragment: &Fragment, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let height = fragment
            .data
            .get("height")
            .and_then(|value| value.as_u64())
            .unwrap_or(16);
        let html = render_minijinja_template(
            self.engine.as_ref(),
            "plugins/spacer.html",
            context! { height => height },
        )?;
        Ok(html)
    }
}

fn strip_markup(html: &str) -> String {
    let mut plain = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                plain.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => plain.push(ch),
            _ => {}
        }
    }
    plain
}
