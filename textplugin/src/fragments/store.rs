// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::model::{Fragment, FragmentId, NewFragment};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn not_found(id: FragmentId) -> Self {
        Self::new(format!("Fragment {} not found", id))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for StoreError {}

/// Placeholder tree storage owned by the host.
///
/// Every method is one atomic unit: a failing call performs no mutation.
/// Multi-call operations rely on the caller's transaction boundary.
pub trait FragmentStore: Send + Sync {
    /// Insert a fragment, assigning its id and its position among siblings.
    fn create(&self, fragment: NewFragment) -> Result<Fragment, StoreError>;

    fn get(&self, id: FragmentId) -> Result<Option<Fragment>, StoreError>;

    /// Batched lookup; ids that do not exist are absent from the result.
    fn get_many(&self, ids: &[FragmentId]) -> Result<HashMap<FragmentId, Fragment>, StoreError>;

    /// Replace a stored fragment (matched by id).
    fn update(&self, fragment: &Fragment) -> Result<(), StoreError>;

    /// Delete the given fragments and all of their descendants.
    /// Fails without mutation when any id is unknown.
    fn delete(&self, ids: &[FragmentId]) -> Result<(), StoreError>;

    /// Direct children ordered by position.
    fn children(&self, parent: FragmentId) -> Result<Vec<Fragment>, StoreError>;

    /// All descendants; every fragment is listed after its parent.
    fn descendants(&self, parent: FragmentId) -> Result<Vec<Fragment>, StoreError> {
        let mut found = Vec::new();
        let mut frontier = vec![parent];
        while let Some(next) = frontier.pop() {
            let children = self.children(next)?;
            frontier.extend(children.iter().rev().map(|child| child.id));
            found.extend(children);
        }
        Ok(found)
    }
}
