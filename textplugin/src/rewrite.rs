// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::fragments::{
    Fragment, FragmentId, FragmentStore, NewFragment, PlaceholderId, StoreError,
};
use crate::tags;
use std::collections::HashMap;

/// Re-point references through `map`; ids missing from the map stay as they are.
pub fn rewrite(body: &str, map: &HashMap<FragmentId, FragmentId>) -> String {
    tags::substitute(body, |tag| match map.get(&tag.id()) {
        Some(new_id) => tag.with_id(*new_id).to_markup(),
        None => tag.to_markup(),
    })
}

/// Rewrite the body of an already copied text fragment and persist it.
pub fn post_copy(
    store: &dyn FragmentStore,
    text_id: FragmentId,
    map: &HashMap<FragmentId, FragmentId>,
) -> Result<Fragment, StoreError> {
    let mut text = store
        .get(text_id)?
        .ok_or_else(|| StoreError::not_found(text_id))?;
    let body = rewrite(&text.body, map);
    if body != text.body {
        text.body = body;
        store.update(&text)?;
    }
    Ok(text)
}

#[derive(Debug, Clone)]
pub struct CopyOutcome {
    pub text: Fragment,
    /// Old id to new id for the text fragment and every descendant.
    pub id_map: HashMap<FragmentId, FragmentId>,
}

/// Copy a text fragment and its whole subtree into `placeholder`/`language`,
/// then re-point every copied body at the new children.
pub fn copy_text_fragment(
    store: &dyn FragmentStore,
    source_id: FragmentId,
    placeholder: PlaceholderId,
    language: &str,
) -> Result<CopyOutcome, StoreError> {
    let source = store
        .get(source_id)?
        .ok_or_else(|| StoreError::not_found(source_id))?;
    if !source.is_text() {
        return Err(StoreError::new(format!(
            "Fragment {} is a {}, not a text fragment",
            source.id, source.plugin_type
        )));
    }

    let root = store.create(NewFragment::copy_of(&source, placeholder, language))?;
    let mut id_map = HashMap::from([(source.id, root.id)]);
    let mut copied_texts = vec![root.id];

    for original in store.descendants(source.id)? {
        let parent = original
            .parent
            .and_then(|parent| id_map.get(&parent).copied())
            .ok_or_else(|| {
                StoreError::new(format!("Parent of fragment {} was not copied", original.id))
            })?;
        let copy = store.create(
            NewFragment::copy_of(&original, placeholder, language).under(Some(parent)),
        )?;
        if copy.is_text() {
            copied_texts.push(copy.id);
        }
        id_map.insert(original.id, copy.id);
    }

    for text_id in &copied_texts[1..] {
        post_copy(store, *text_id, &id_map)?;
    }
    let text = post_copy(store, root.id, &id_map)?;
    log::debug!(
        "Copied text fragment {} to {} with {} descendants",
        source.id,
        text.id,
        id_map.len() - 1
    );

    Ok(CopyOutcome { text, id_map })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::{MemoryFragmentStore, TEXT_PLUGIN_TYPE};
    use serde_json::json;

    #[test]
    fn rewrite_maps_ids_and_keeps_attributes() {
        let body = concat!(
            r#"<p><cms-plugin alt="Link - a "title="Link - a" id="5"></cms-plugin>"#,
            r#"<cms-plugin title='b' id=6 data-x="y">keep</cms-plugin></p>"#
        );
        let map = HashMap::from([(FragmentId(5), FragmentId(15)), (FragmentId(6), FragmentId(16))]);
        assert_eq!(
            rewrite(body, &map),
            concat!(
                r#"<p><cms-plugin alt="Link - a "title="Link - a" id="15"></cms-plugin>"#,
                r#"<cms-plugin title='b' id=16 data-x="y">keep</cms-plugin></p>"#
            )
        );
    }

    #[test]
    fn rewrite_leaves_unmapped_ids() {
        let body = r#"<cms-plugin id="5"></cms-plugin><cms-plugin id="7"></cms-plugin>"#;
        let map = HashMap::from([(FragmentId(5), FragmentId(50))]);
        assert_eq!(
            tags::id_list(&rewrite(body, &map)),
            vec![FragmentId(50), FragmentId(7)]
        );
    }

    #[test]
    fn swapped_ids_do_not_collide() {
        let body = r#"<cms-plugin id="1"></cms-plugin><cms-plugin id="2"></cms-plugin>"#;
        let map = HashMap::from([(FragmentId(1), FragmentId(2)), (FragmentId(2), FragmentId(1))]);
        assert_eq!(
            tags::id_list(&rewrite(body, &map)),
            vec![FragmentId(2), FragmentId(1)]
        );
    }

    #[test]
    fn copy_rewrites_every_copied_body() {
        let store = MemoryFragmentStore::new();
        let text = store
            .create(NewFragment::text(PlaceholderId(1), "en", ""))
            .expect("text");
        let link = store
            .create(NewFragment::child(&text, "LinkPlugin", json!({"name": "x"})))
            .expect("link");
        let nested = store
            .create(NewFragment::child(&text, TEXT_PLUGIN_TYPE, json!({})))
            .expect("nested");
        let spacer = store
            .create(NewFragment::child(&nested, "SpacerPlugin", json!({})))
            .expect("spacer");

        let mut nested = nested;
        nested.body = format!(r#"<cms-plugin id="{}"></cms-plugin>"#, spacer.id);
        store.update(&nested).expect("update nested");
        let mut text = text;
        text.body = format!(
            r#"<p><cms-plugin id="{}"></cms-plugin> and <cms-plugin id="{}"></cms-plugin></p>"#,
            link.id, nested.id
        );
        store.update(&text).expect("update text");

        let outcome = copy_text_fragment(&store, text.id, PlaceholderId(2), "de").expect("copy");

        assert_eq!(outcome.id_map.len(), 4);
        assert_eq!(outcome.text.language, "de");
        let new_link = outcome.id_map[&link.id];
        let new_nested = outcome.id_map[&nested.id];
        assert_eq!(tags::id_list(&outcome.text.body), vec![new_link, new_nested]);

        let copied_nested = store.get(new_nested).expect("get").expect("copied nested");
        assert_eq!(copied_nested.parent, Some(outcome.text.id));
        assert_eq!(
            tags::id_list(&copied_nested.body),
            vec![outcome.id_map[&spacer.id]]
        );

        let original = store.get(text.id).expect("get").expect("original");
        assert_eq!(tags::id_list(&original.body), vec![link.id, nested.id]);
    }

    #[test]
    fn post_copy_of_missing_fragment_fails() {
        let store = MemoryFragmentStore::new();
        assert!(post_copy(&store, FragmentId(9), &HashMap::new()).is_err());
    }
}
