// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Editing workflow of a text fragment: ghost creation, save, cancel and
//! out-of-band child preview.
//!
//! Every operation checks everything before its single store mutation, so a
//! rejected request never leaves partial changes behind.

use crate::error::ActionError;
use crate::fragments::{
    Fragment, FragmentId, FragmentState, FragmentStore, NewFragment, PlaceholderId,
};
use crate::plugins::PluginRegistry;
use crate::render::{RenderContext, render_admin, render_child_preview};
use crate::sanitizer::HtmlSanitizer;
use crate::tags::{self, plugin_to_tag};
use crate::token::ActionTokens;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// The person behind a request: their session and user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editor {
    pub session_id: String,
    pub user_id: String,
}

impl Editor {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// What the editor needs to open a text fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorView {
    pub id: FragmentId,
    /// Body rendered with admin tags.
    pub body: String,
    pub action_token: String,
    pub ghost: bool,
}

/// How a cancel request was honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The ghost fragment and the claimed children are gone.
    Discarded,
    /// Only the claimed children of a confirmed fragment were removed.
    ChildrenDiscarded,
}

pub struct TextActions<'a> {
    pub store: &'a dyn FragmentStore,
    pub registry: &'a PluginRegistry,
    pub tokens: &'a ActionTokens,
}

impl<'a> TextActions<'a> {
    pub fn new(
        store: &'a dyn FragmentStore,
        registry: &'a PluginRegistry,
        tokens: &'a ActionTokens,
    ) -> Self {
        Self {
            store,
            registry,
            tokens,
        }
    }

    /// Create an empty text fragment in ghost state.
    pub fn add_ghost(
        &self,
        placeholder: PlaceholderId,
        language: &str,
        parent: Option<FragmentId>,
    ) -> Result<Fragment, ActionError> {
        if language.trim().is_empty() {
            return Err(ActionError::malformed("Missing language"));
        }
        if let Some(parent_id) = parent {
            let parent = self
                .store
                .get(parent_id)?
                .ok_or_else(|| ActionError::malformed(format!("Parent {} not found", parent_id)))?;
            if parent.placeholder != placeholder || parent.language != language {
                return Err(ActionError::malformed(format!(
                    "Parent {} belongs to another placeholder or language",
                    parent_id
                )));
            }
        }
        let ghost = self
            .store
            .create(NewFragment::ghost_text(placeholder, language).under(parent))?;
        log::info!("Created ghost text fragment {} in placeholder {}", ghost.id, placeholder);
        Ok(ghost)
    }

    /// Admin rendering of a text fragment plus a fresh action token.
    pub fn open_editor(&self, editor: &Editor, id: FragmentId) -> Result<EditorView, ActionError> {
        let fragment = self.text_fragment(id)?;
        let ctx = RenderContext::new(self.store, self.registry).with_user(&editor.user_id);
        Ok(EditorView {
            id: fragment.id,
            body: render_admin(&fragment.body, &ctx)?,
            action_token: self.tokens.issue(&editor.session_id, &editor.user_id, fragment.id),
            ghost: fragment.is_ghost(),
        })
    }

    /// Sanitize and store a submitted body, confirming the fragment.
    ///
    /// Every reference is reduced to the canonical empty tag of the child it
    /// names; references to anything that is not a child of this fragment are
    /// dropped. Child content can therefore not be edited through the body.
    pub fn save_body(
        &self,
        sanitizer: &HtmlSanitizer,
        id: FragmentId,
        submitted: &str,
    ) -> Result<Fragment, ActionError> {
        let mut fragment = self.text_fragment(id)?;
        if submitted.trim().is_empty() && fragment.is_ghost() {
            return Err(ActionError::malformed(format!(
                "Empty submission for ghost fragment {}",
                id
            )));
        }

        // Child markup never passes through the HTML parser, which would
        // hoist block content out of a reference nested in a paragraph.
        let emptied = tags::substitute(submitted, |tag| tag.with_content(""));
        let cleaned = sanitizer.clean(&emptied);
        let children: HashMap<FragmentId, Fragment> = self
            .store
            .children(id)?
            .into_iter()
            .map(|child| (child.id, child))
            .collect();
        fragment.body = tags::substitute(&cleaned, |tag| match children.get(&tag.id()) {
            Some(child) => plugin_to_tag(child.id, &self.registry.label(child), "", None),
            None => {
                log::warn!(
                    "Dropping reference to fragment {} from the body of {}",
                    tag.id(),
                    id
                );
                String::new()
            }
        });
        fragment.state = FragmentState::Confirmed;
        self.store.update(&fragment)?;
        log::debug!("Saved body of text fragment {}", id);
        Ok(fragment)
    }

    /// Remove a ghost fragment together with unsaved children the editor created.
    pub fn discard(
        &self,
        editor: &Editor,
        token: &str,
        id: FragmentId,
        claimed_children: &[FragmentId],
    ) -> Result<(), ActionError> {
        self.check_token(editor, token, id)?;
        let fragment = self
            .store
            .get(id)?
            .ok_or_else(|| ActionError::malformed(format!("Fragment {} not found", id)))?;
        if !fragment.is_ghost() {
            return Err(ActionError::malformed(format!(
                "Fragment {} is confirmed and cannot be discarded",
                id
            )));
        }
        let claimed = self.unsaved_children(&fragment, claimed_children)?;

        let mut doomed = vec![fragment.id];
        doomed.extend(claimed);
        self.store.delete(&doomed)?;
        log::info!(
            "Discarded ghost fragment {} and {} unsaved children",
            id,
            doomed.len() - 1
        );
        Ok(())
    }

    /// Remove children that were added during an edit which was then cancelled.
    /// The confirmed fragment itself stays.
    pub fn discard_unsaved_children(
        &self,
        editor: &Editor,
        token: &str,
        id: FragmentId,
        claimed_children: &[FragmentId],
    ) -> Result<(), ActionError> {
        self.check_token(editor, token, id)?;
        if claimed_children.is_empty() {
            return Err(ActionError::malformed("No children claimed"));
        }
        let fragment = self
            .store
            .get(id)?
            .ok_or_else(|| ActionError::malformed(format!("Fragment {} not found", id)))?;
        let claimed = self.unsaved_children(&fragment, claimed_children)?;
        self.store.delete(&claimed)?;
        log::info!("Discarded {} unsaved children of fragment {}", claimed.len(), id);
        Ok(())
    }

    /// Cancel an edit session; the token names the fragment.
    pub fn cancel(
        &self,
        editor: &Editor,
        token: &str,
        claimed_children: &[FragmentId],
    ) -> Result<CancelOutcome, ActionError> {
        let id = self
            .tokens
            .decode(token, &editor.session_id, &editor.user_id)
            .ok_or_else(|| {
                log::warn!("Rejected cancel token for user {}", editor.user_id);
                ActionError::InvalidToken
            })?;
        let fragment = self
            .store
            .get(id)?
            .ok_or_else(|| ActionError::malformed(format!("Fragment {} not found", id)))?;

        if fragment.is_ghost() {
            self.discard(editor, token, id, claimed_children)?;
            Ok(CancelOutcome::Discarded)
        } else if !claimed_children.is_empty() {
            self.discard_unsaved_children(editor, token, id, claimed_children)?;
            Ok(CancelOutcome::ChildrenDiscarded)
        } else {
            Err(ActionError::malformed(format!(
                "Fragment {} is confirmed and no children were claimed",
                id
            )))
        }
    }

    /// Admin preview of one child of `parent`.
    pub fn render_child(
        &self,
        editor: &Editor,
        token: &str,
        parent: FragmentId,
        child: FragmentId,
    ) -> Result<String, ActionError> {
        let Some(token_target) = self.tokens.decode(token, &editor.session_id, &editor.user_id)
        else {
            log::warn!("Rejected render token for user {}", editor.user_id);
            return Err(ActionError::InvalidToken);
        };
        if token_target != parent {
            return Err(ActionError::malformed(format!(
                "Token is for fragment {}, not {}",
                token_target, parent
            )));
        }
        let child = self
            .store
            .get(child)?
            .filter(|fragment| fragment.is_child_of(parent))
            .ok_or_else(|| {
                ActionError::malformed(format!("Fragment {} is not a child of {}", child, parent))
            })?;

        let ctx = RenderContext::new(self.store, self.registry).with_user(&editor.user_id);
        Ok(render_child_preview(&child, &ctx))
    }

    fn check_token(&self, editor: &Editor, token: &str, id: FragmentId) -> Result<(), ActionError> {
        if self
            .tokens
            .validate(token, &editor.session_id, &editor.user_id, id)
        {
            Ok(())
        } else {
            log::warn!("Rejected action token for fragment {} by user {}", id, editor.user_id);
            Err(ActionError::InvalidToken)
        }
    }

    fn text_fragment(&self, id: FragmentId) -> Result<Fragment, ActionError> {
        match self.store.get(id)? {
            Some(fragment) if fragment.is_text() => Ok(fragment),
            Some(fragment) => Err(ActionError::malformed(format!(
                "Fragment {} is a {}",
                id, fragment.plugin_type
            ))),
            None => Err(ActionError::malformed(format!("Fragment {} not found", id))),
        }
    }

    /// Claimed ids, deduplicated, after checking each is a direct child of
    /// `fragment` that its saved body does not reference.
    fn unsaved_children(
        &self,
        fragment: &Fragment,
        claimed: &[FragmentId],
    ) -> Result<Vec<FragmentId>, ActionError> {
        if claimed.is_empty() {
            return Ok(Vec::new());
        }
        let children: HashSet<FragmentId> = self
            .store
            .children(fragment.id)?
            .into_iter()
            .map(|child| child.id)
            .collect();
        let saved: HashSet<FragmentId> = tags::id_list(&fragment.body).into_iter().collect();

        let mut seen = HashSet::new();
        let mut eligible = Vec::new();
        for id in claimed {
            if !children.contains(id) {
                return Err(ActionError::malformed(format!(
                    "Fragment {} is not a child of {}",
                    id, fragment.id
                )));
            }
            if saved.contains(id) {
                return Err(ActionError::malformed(format!(
                    "Child {} is saved in the body of {}",
                    id, fragment.id
                )));
            }
            if seen.insert(*id) {
                eligible.push(*id);
            }
        }
        Ok(eligible)
    }
}
