// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::fragments::{FragmentId, FragmentStore, StoreError};
use crate::plugins::PluginRegistry;
use crate::resolver::resolve;
use crate::tags;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A body prepared for translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationExport {
    /// The body with translatable child text inlined into the reference tags.
    pub content: String,
    /// Children still present, in body order.
    pub children: Vec<FragmentId>,
}

/// Inline each translatable child's text into its tag. Untranslatable
/// children keep an empty tag; references to missing children are removed.
pub fn export(
    body: &str,
    store: &dyn FragmentStore,
    registry: &PluginRegistry,
) -> Result<TranslationExport, StoreError> {
    let resolved = resolve(body, store)?;
    let mut seen = HashSet::new();
    let mut children = Vec::new();

    let content = tags::substitute(body, |tag| {
        let Some(child) = resolved.get(tag.id()) else {
            return String::new();
        };
        if seen.insert(child.id) {
            children.push(child.id);
        }
        let text = registry.translatable_content(child).unwrap_or_default();
        tag.with_content(&text)
    });

    Ok(TranslationExport { content, children })
}

/// Translated text of every exported child. Children of the export that
/// vanished from the translation map to an empty string; tags that were not
/// part of the export are ignored.
pub fn import(translated: &str, exported: &TranslationExport) -> HashMap<FragmentId, String> {
    let included: HashSet<FragmentId> = exported.children.iter().copied().collect();
    let mut translations: HashMap<FragmentId, String> = HashMap::new();

    for tag in tags::extract(translated) {
        if included.contains(&tag.id()) {
            translations
                .entry(tag.id())
                .or_insert_with(|| tag.content().to_string());
        }
    }
    for id in &exported.children {
        translations.entry(*id).or_default();
    }
    translations
}

/// Storable body from a translated export: every reference emptied.
pub fn strip_reference_content(translated: &str) -> String {
    tags::substitute(translated, |tag| tag.with_content(""))
}
