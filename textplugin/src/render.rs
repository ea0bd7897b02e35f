// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Substitution of reference tags with the output of their plugins.
//!
//! Three flavours share one pipeline:
//! - [`render`] keeps each tag and fills it with the plugin output,
//! - [`render_admin`] emits canonical editor tags flagged with `render-plugin`,
//! - [`render_publish`] drops the tags and keeps only the output.
//!
//! References to missing fragments are removed in every flavour.

use crate::fragments::{Fragment, FragmentId, FragmentStore, StoreError};
use crate::plugins::PluginRegistry;
use crate::resolver::resolve;
use crate::tags::{self, plugin_to_tag};
use std::collections::HashMap;

/// Maximum depth of text fragments rendered inside text fragments.
pub const MAX_NESTING: usize = 8;

/// Everything a plugin renderer may look at.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub store: &'a dyn FragmentStore,
    pub registry: &'a PluginRegistry,
    /// Editing user, when rendering for the admin.
    pub user: Option<&'a str>,
    depth: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new(store: &'a dyn FragmentStore, registry: &'a PluginRegistry) -> Self {
        Self {
            store,
            registry,
            user: None,
            depth: 0,
        }
    }

    pub fn with_user(mut self, user: &'a str) -> Self {
        self.user = Some(user);
        self
    }

    /// Context for a body rendered inside a plugin; `None` past [`MAX_NESTING`].
    pub fn nested(&self) -> Option<Self> {
        (self.depth < MAX_NESTING).then(|| Self {
            depth: self.depth + 1,
            ..*self
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Embedded,
    Admin,
    Publish,
}

/// Fill every live reference with its plugin output, keeping the original tag.
/// Disabled plugins get the canonical tag around the disabled marker.
pub fn render(body: &str, ctx: &RenderContext<'_>) -> Result<String, StoreError> {
    render_with(body, ctx, Mode::Embedded)
}

/// Editor flavour: canonical tags carrying `render-plugin` so the editor
/// chrome knows which children it may preview.
pub fn render_admin(body: &str, ctx: &RenderContext<'_>) -> Result<String, StoreError> {
    render_with(body, ctx, Mode::Admin)
}

/// Public flavour: bare plugin output. The preview switch only concerns the
/// editor, so disabled plugins render normally here.
pub fn render_publish(body: &str, ctx: &RenderContext<'_>) -> Result<String, StoreError> {
    render_with(body, ctx, Mode::Publish)
}

/// Admin tag for a single child, as served to the editor's live preview.
pub fn render_child_preview(child: &Fragment, ctx: &RenderContext<'_>) -> String {
    let preview = ctx.registry.preview_enabled(child);
    let content = plugin_content(child, ctx, preview);
    plugin_to_tag(child.id, &ctx.registry.label(child), &content, Some(preview))
}

fn render_with(body: &str, ctx: &RenderContext<'_>, mode: Mode) -> Result<String, StoreError> {
    let resolved = resolve(body, ctx.store)?;
    if resolved.is_empty() {
        return Ok(body.to_string());
    }
    log::trace!(
        "Rendering {} referenced fragments ({:?}, depth {}, user {:?})",
        resolved.ids().len(),
        mode,
        ctx.depth,
        ctx.user
    );

    let mut rendered: HashMap<FragmentId, String> = HashMap::new();
    let output = tags::substitute(body, |tag| {
        let Some(fragment) = resolved.get(tag.id()) else {
            log::trace!("Dropping reference to missing fragment {}", tag.id());
            return String::new();
        };
        let preview = mode == Mode::Publish || ctx.registry.preview_enabled(fragment);
        let content = rendered
            .entry(fragment.id)
            .or_insert_with(|| plugin_content(fragment, ctx, preview));

        match mode {
            Mode::Publish => content.clone(),
            Mode::Admin => plugin_to_tag(
                fragment.id,
                &ctx.registry.label(fragment),
                content,
                Some(preview),
            ),
            Mode::Embedded if preview => tag.with_content(content),
            Mode::Embedded => plugin_to_tag(fragment.id, &ctx.registry.label(fragment), content, None),
        }
    });
    Ok(output)
}

fn plugin_content(fragment: &Fragment, ctx: &RenderContext<'_>, preview: bool) -> String {
    if !preview {
        return ctx.registry.disabled_marker();
    }
    match ctx.registry.render(fragment, ctx) {
        Ok(html) => html.trim().to_string(),
        Err(err) => {
            log::warn!(
                "Plugin {} ({}) failed to render: {}",
                fragment.id,
                fragment.plugin_type,
                err
            );
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::{MemoryFragmentStore, NewFragment, PlaceholderId};
    use crate::plugins::{PluginRenderer, RenderError};
    use serde_json::json;
    use std::sync::Arc;

    struct Echo;

    impl PluginRenderer for Echo {
        fn name(&self) -> &str {
            "Echo"
        }

        fn render(&self, fragment: &Fragment, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
            Ok(format!(" <em>{}</em>\n", fragment.data_str("say").unwrap_or("")))
        }
    }

    struct Hidden;

    impl PluginRenderer for Hidden {
        fn name(&self) -> &str {
            "Preview Disabled Plugin"
        }

        fn render(&self, _fragment: &Fragment, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
            Ok("<i>hidden</i>".to_string())
        }

        fn text_editor_preview(&self) -> bool {
            false
        }
    }

    struct Broken;

    impl PluginRenderer for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        fn render(&self, _fragment: &Fragment, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
            Err(RenderError::new("boom"))
        }
    }

    struct Fixture {
        store: MemoryFragmentStore,
        registry: PluginRegistry,
        text: Fragment,
    }

    impl Fixture {
        fn new() -> Self {
            let store = MemoryFragmentStore::new();
            let text = store
                .create(NewFragment::text(PlaceholderId(1), "en", ""))
                .expect("text");
            let mut registry = PluginRegistry::default();
            registry.register("Echo", Arc::new(Echo));
            registry.register("Hidden", Arc::new(Hidden));
            registry.register("Broken", Arc::new(Broken));
            Self {
                store,
                registry,
                text,
            }
        }

        fn child(&self, plugin_type: &str, say: &str) -> Fragment {
            self.store
                .create(NewFragment::child(&self.text, plugin_type, json!({"say": say})))
                .expect("child")
        }

        fn ctx(&self) -> RenderContext<'_> {
            RenderContext::new(&self.store, &self.registry)
        }
    }

    #[test]
    fn embedded_render_keeps_the_tag_and_fills_content() {
        let fx = Fixture::new();
        let echo = fx.child("Echo", "hi");
        let body = format!(r#"<p>A <cms-plugin title="keep" id="{}">stale</cms-plugin></p>"#, echo.id);
        let html = render(&body, &fx.ctx()).expect("render");
        assert_eq!(
            html,
            format!(r#"<p>A <cms-plugin title="keep" id="{}"><em>hi</em></cms-plugin></p>"#, echo.id)
        );
    }

    #[test]
    fn disabled_then_missing_reference() {
        let fx = Fixture::new();
        let hidden = fx.child("Hidden", "");
        let body = format!(
            r#"<cms-plugin id="{}"></cms-plugin><cms-plugin id="404">old text</cms-plugin>"#,
            hidden.id
        );
        let html = render(&body, &fx.ctx()).expect("render");
        assert_eq!(
            html,
            format!(
                r#"<cms-plugin alt="Preview Disabled Plugin - {0} "title="Preview Disabled Plugin - {0}" id="{0}"><span>Preview is disabled for this plugin</span></cms-plugin>"#,
                hidden.id
            )
        );
    }

    #[test]
    fn admin_render_marks_preview_flag() {
        let fx = Fixture::new();
        let echo = fx.child("Echo", "x");
        let hidden = fx.child("Hidden", "");
        let body = format!(r#"<cms-plugin id="{}"></cms-plugin><cms-plugin id="{}"></cms-plugin>"#, echo.id, hidden.id);
        let html = render_admin(&body, &fx.ctx()).expect("render");
        assert!(html.starts_with(&format!(
            r#"<cms-plugin render-plugin=true alt="Echo - {0} "title="Echo - {0}" id="{0}"><em>x</em></cms-plugin>"#,
            echo.id
        )));
        assert!(html.contains("render-plugin=false"));
        assert!(html.contains("<span>Preview is disabled for this plugin</span>"));
    }

    #[test]
    fn publish_render_emits_bare_output() {
        let fx = Fixture::new();
        let echo = fx.child("Echo", "pub");
        let hidden = fx.child("Hidden", "");
        let body = format!(
            r#"<p><cms-plugin id="{}"></cms-plugin>|<cms-plugin id="{}"></cms-plugin>|<cms-plugin id="77"></cms-plugin></p>"#,
            echo.id, hidden.id
        );
        let html = render_publish(&body, &fx.ctx()).expect("render");
        assert_eq!(html, "<p><em>pub</em>|<i>hidden</i>|</p>");
    }

    #[test]
    fn failing_renderer_yields_empty_content() {
        let fx = Fixture::new();
        let broken = fx.child("Broken", "");
        let body = format!(r#"a<cms-plugin id="{}">x</cms-plugin>b"#, broken.id);
        let html = render(&body, &fx.ctx()).expect("render");
        assert_eq!(html, format!(r#"a<cms-plugin id="{}"></cms-plugin>b"#, broken.id));
    }

    #[test]
    fn rendering_is_deterministic_and_batched() {
        let fx = Fixture::new();
        let ids: Vec<FragmentId> = (0..6).map(|i| fx.child("Echo", &i.to_string()).id).collect();
        let body: String = ids
            .iter()
            .chain(ids.iter())
            .map(|id| format!(r#"<cms-plugin id="{}"></cms-plugin>"#, id))
            .collect();

        fx.store.reset_query_count();
        let first = render_admin(&body, &fx.ctx()).expect("render");
        assert_eq!(fx.store.query_count(), 1);
        let second = render_admin(&body, &fx.ctx()).expect("render");
        assert_eq!(first, second);
    }

    #[test]
    fn child_preview_uses_admin_tag() {
        let fx = Fixture::new();
        let hidden = fx.child("Hidden", "");
        assert_eq!(
            render_child_preview(&hidden, &fx.ctx()),
            format!(
                r#"<cms-plugin render-plugin=false alt="Preview Disabled Plugin - {0} "title="Preview Disabled Plugin - {0}" id="{0}"><span>Preview is disabled for this plugin</span></cms-plugin>"#,
                hidden.id
            )
        );
    }

    #[test]
    fn nesting_is_bounded() {
        let fx = Fixture::new();
        let mut ctx = Some(fx.ctx());
        let mut levels = 0;
        while let Some(current) = ctx {
            ctx = current.nested();
            levels += 1;
        }
        assert_eq!(levels, MAX_NESTING + 1);
    }
}
