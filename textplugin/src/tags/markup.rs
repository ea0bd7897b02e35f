// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::tokenizer::{RawElement, TAG_NAME};
use crate::fragments::FragmentId;
use crate::util::html_escape;
use std::ops::Range;

/// A reference to a child fragment found in a text body.
///
/// Keeps the exact markup it was parsed from, so re-emitting an untouched tag
/// reproduces the source byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginTag {
    id: FragmentId,
    open_tag: String,
    /// Range of the `id` value inside `open_tag`.
    id_span: Range<usize>,
    attributes: Vec<(String, Option<String>)>,
    content: String,
    close_tag: String,
    self_closing: bool,
}

impl PluginTag {
    /// Build a tag from a scanned element; `None` when it carries no numeric `id`.
    pub(crate) fn from_element(text: &str, element: &RawElement) -> Option<Self> {
        let open = &element.open;
        let id_attr = open
            .attributes
            .iter()
            .rev()
            .find(|attr| attr.name == "id")?;
        let id_range = id_attr.value.clone()?;
        let id = FragmentId::parse(&text[id_range.clone()])?;

        let attributes = open
            .attributes
            .iter()
            .map(|attr| {
                (
                    attr.name.clone(),
                    attr.value.clone().map(|range| text[range].to_string()),
                )
            })
            .collect();

        Some(Self {
            id,
            open_tag: text[open.start..open.end].to_string(),
            id_span: (id_range.start - open.start)..(id_range.end - open.start),
            attributes,
            content: text[element.content.clone()].to_string(),
            close_tag: text[element.content.end..element.end].to_string(),
            self_closing: open.self_closing,
        })
    }

    pub fn id(&self) -> FragmentId {
        self.id
    }

    /// Raw attribute value (names are matched case-insensitively).
    pub fn attribute(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.attributes
            .iter()
            .find(|(attr, _)| *attr == name)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn alt(&self) -> Option<&str> {
        self.attribute("alt")
    }

    pub fn title(&self) -> Option<&str> {
        self.attribute("title")
    }

    /// Value of the admin `render-plugin` flag, when present.
    pub fn render_plugin(&self) -> Option<bool> {
        match self.attribute("render-plugin")? {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// Literal content between the open and close tags.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The original markup of the whole element.
    pub fn to_markup(&self) -> String {
        format!("{}{}{}", self.open_tag, self.content, self.close_tag)
    }

    /// The element with the same open tag and `content` as its body.
    pub fn with_content(&self, content: &str) -> String {
        if self.self_closing {
            let open = self.open_tag.trim_end_matches('>').trim_end_matches('/').trim_end();
            return format!("{}>{}</{}>", open, content, TAG_NAME);
        }
        format!("{}{}{}", self.open_tag, content, self.close_tag)
    }

    /// A copy pointing at `id`; every other byte of the tag is preserved.
    pub fn with_id(&self, id: FragmentId) -> Self {
        let value = id.to_string();
        let mut open_tag = String::with_capacity(self.open_tag.len() + value.len());
        open_tag.push_str(&self.open_tag[..self.id_span.start]);
        open_tag.push_str(&value);
        open_tag.push_str(&self.open_tag[self.id_span.end..]);

        let mut attributes = self.attributes.clone();
        if let Some(entry) = attributes.iter_mut().rev().find(|(name, _)| name == "id") {
            entry.1 = Some(value.clone());
        }

        Self {
            id,
            id_span: self.id_span.start..self.id_span.start + value.len(),
            open_tag,
            attributes,
            content: self.content.clone(),
            close_tag: self.close_tag.clone(),
            self_closing: self.self_closing,
        }
    }
}

/// Canonical markup for a reference to fragment `id`.
///
/// `admin` adds the `render-plugin` flag the editor uses to decide whether
/// live preview is available. The missing space before `title` is the
/// historical wire format and existing bodies depend on it.
pub fn plugin_to_tag(id: FragmentId, label: &str, content: &str, admin: Option<bool>) -> String {
    let label = html_escape(label);
    match admin {
        Some(preview) => format!(
            r#"<{tag} render-plugin={preview} alt="{label} "title="{label}" id="{id}">{content}</{tag}>"#,
            tag = TAG_NAME,
            preview = preview,
            label = label,
            id = id,
            content = content,
        ),
        None => format!(
            r#"<{tag} alt="{label} "title="{label}" id="{id}">{content}</{tag}>"#,
            tag = TAG_NAME,
            label = label,
            id = id,
            content = content,
        ),
    }
}
