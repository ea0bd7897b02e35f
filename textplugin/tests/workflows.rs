// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde_json::json;
use std::sync::Arc;
use textplugin::fragments::{FragmentStore, MemoryFragmentStore, NewFragment, PlaceholderId};
use textplugin::plugins::{PluginRegistry, register_builtin};
use textplugin::render::{RenderContext, render_publish};
use textplugin::rewrite::copy_text_fragment;
use textplugin::tags;
use textplugin::templates::MiniJinjaEngine;
use textplugin::translation::{export, import, strip_reference_content};

fn registry() -> PluginRegistry {
    let mut registry = PluginRegistry::default();
    register_builtin(&mut registry, Arc::new(MiniJinjaEngine::new()));
    registry
}

#[test]
fn copied_page_renders_its_own_children() {
    let store = MemoryFragmentStore::new();
    let registry = registry();
    let text = store
        .create(NewFragment::text(PlaceholderId(1), "en", ""))
        .expect("text");
    let link = store
        .create(NewFragment::child(
            &text,
            "LinkPlugin",
            json!({"name": "Docs", "external_link": "https://example.com/"}),
        ))
        .expect("link");
    let nested = store
        .create(NewFragment::child(&text, "TextPlugin", json!({})))
        .expect("nested");
    let mut nested_text = nested.clone();
    nested_text.body = "<em>inner</em>".to_string();
    store.update(&nested_text).expect("nested body");

    let mut source = text.clone();
    source.body = format!(
        r#"<p><cms-plugin id="{}"></cms-plugin> and <cms-plugin id="{}"></cms-plugin></p>"#,
        link.id, nested.id
    );
    store.update(&source).expect("source body");

    let outcome =
        copy_text_fragment(&store, text.id, PlaceholderId(2), "de").expect("copy");
    let copied_ids = tags::id_list(&outcome.text.body);
    assert_eq!(copied_ids.len(), 2);
    for id in &copied_ids {
        let copy = store.get(*id).expect("get").expect("copied child");
        assert_eq!(copy.parent, Some(outcome.text.id));
        assert_eq!(copy.placeholder, PlaceholderId(2));
        assert_eq!(copy.language, "de");
    }
    assert_eq!(outcome.id_map[&link.id], copied_ids[0]);

    let ctx = RenderContext::new(&store, &registry);
    let published = render_publish(&outcome.text.body, &ctx).expect("render");
    assert!(published.contains(">Docs</a>"));
    assert!(published.contains("<em>inner</em>"));
    assert!(!published.contains("cms-plugin"));

    let original = store.get(text.id).expect("get").expect("source");
    assert_eq!(original.body, source.body);
}

#[test]
fn translation_round_trip_keeps_references() {
    let store = MemoryFragmentStore::new();
    let registry = registry();
    let text = store
        .create(NewFragment::text(PlaceholderId(1), "en", ""))
        .expect("text");
    let link = store
        .create(NewFragment::child(&text, "LinkPlugin", json!({"name": "Read more"})))
        .expect("link");
    let body = format!(
        r#"<p>Hello <cms-plugin alt="Link - Read more "title="Link - Read more" id="{}"></cms-plugin></p>"#,
        link.id
    );

    let exported = export(&body, &store, &registry).expect("export");
    assert!(exported.content.contains(">Read more</cms-plugin>"));

    let translated = exported
        .content
        .replace("Hello", "Hallo")
        .replace(">Read more<", ">Weiterlesen<");
    let children = import(&translated, &exported);
    assert_eq!(children[&link.id], "Weiterlesen");

    let stored = strip_reference_content(&translated);
    assert!(stored.starts_with("<p>Hallo "));
    assert_eq!(tags::id_list(&stored), vec![link.id]);
    assert!(!stored.contains("Weiterlesen"));
}
