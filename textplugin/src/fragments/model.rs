// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Plugin type of the outer rich-text fragment.
pub const TEXT_PLUGIN_TYPE: &str = "TextPlugin";

/// Identifier of a fragment node in the placeholder tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentId(pub u64);

impl FragmentId {
    /// Parse a strictly decimal identifier (no sign, no whitespace).
    pub fn parse(value: &str) -> Option<Self> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        value.parse::<u64>().ok().map(FragmentId)
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderId(pub u64);

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentState {
    /// Created by an "add" request, not yet submitted by the editor.
    Ghost,
    Confirmed,
}

/// A node of the placeholder tree: either a rich-text fragment (`body` is
/// meaningful) or a child plugin carrying a type-specific `data` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: FragmentId,
    pub placeholder: PlaceholderId,
    pub language: String,
    pub position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<FragmentId>,
    pub plugin_type: String,
    pub state: FragmentState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl Fragment {
    pub fn is_ghost(&self) -> bool {
        self.state == FragmentState::Ghost
    }

    pub fn is_text(&self) -> bool {
        self.plugin_type == TEXT_PLUGIN_TYPE
    }

    pub fn is_child_of(&self, parent: FragmentId) -> bool {
        self.parent == Some(parent)
    }

    /// String field from the plugin payload.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// Everything needed to create a fragment; the store assigns id and position.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFragment {
    pub placeholder: PlaceholderId,
    pub language: String,
    pub parent: Option<FragmentId>,
    pub plugin_type: String,
    pub state: FragmentState,
    pub body: String,
    pub data: Map<String, Value>,
}

impl NewFragment {
    /// A ghost rich-text fragment with an empty body.
    pub fn ghost_text(placeholder: PlaceholderId, language: &str) -> Self {
        Self {
            placeholder,
            language: language.to_string(),
            parent: None,
            plugin_type: TEXT_PLUGIN_TYPE.to_string(),
            state: FragmentState::Ghost,
            body: String::new(),
            data: Map::new(),
        }
    }

    /// A confirmed rich-text fragment with the given body.
    pub fn text(placeholder: PlaceholderId, language: &str, body: &str) -> Self {
        Self {
            state: FragmentState::Confirmed,
            body: body.to_string(),
            ..Self::ghost_text(placeholder, language)
        }
    }

    /// A confirmed child plugin placed under `parent`, sharing its placeholder and language.
    pub fn child(parent: &Fragment, plugin_type: &str, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            placeholder: parent.placeholder,
            language: parent.language.clone(),
            parent: Some(parent.id),
            plugin_type: plugin_type.to_string(),
            state: FragmentState::Confirmed,
            body: String::new(),
            data,
        }
    }

    pub fn under(mut self, parent: Option<FragmentId>) -> Self {
        self.parent = parent;
        self
    }

    /// Template for copying `source` into another placeholder/language.
    pub fn copy_of(source: &Fragment, placeholder: PlaceholderId, language: &str) -> Self {
        Self {
            placeholder,
            language: language.to_string(),
            parent: None,
            plugin_type: source.plugin_type.clone(),
            state: source.state,
            body: source.body.clone(),
            data: source.data.clone(),
        }
    }
}
