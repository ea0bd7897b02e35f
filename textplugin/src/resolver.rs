// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::fragments::{Fragment, FragmentId, FragmentStore, StoreError};
use crate::tags;
use std::collections::{HashMap, HashSet};

/// Fragments referenced by one body, fetched with a single batched lookup.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    ids: Vec<FragmentId>,
    fragments: HashMap<FragmentId, Fragment>,
}

impl Resolved {
    /// Distinct referenced ids in body order, missing ones included.
    pub fn ids(&self) -> &[FragmentId] {
        &self.ids
    }

    /// `None` when the fragment was deleted or never existed.
    pub fn get(&self, id: FragmentId) -> Option<&Fragment> {
        self.fragments.get(&id)
    }

    pub fn is_missing(&self, id: FragmentId) -> bool {
        !self.fragments.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Distinct reference ids of `body`, first occurrence order.
pub fn unique_ids(body: &str) -> Vec<FragmentId> {
    let mut seen = HashSet::new();
    tags::id_list(body)
        .into_iter()
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Resolve every reference of `body`. Issues no query when there are none.
pub fn resolve(body: &str, store: &dyn FragmentStore) -> Result<Resolved, StoreError> {
    let ids = unique_ids(body);
    if ids.is_empty() {
        return Ok(Resolved::default());
    }
    let fragments = store.get_many(&ids)?;
    if fragments.len() < ids.len() {
        log::debug!(
            "{} of {} referenced fragments are missing",
            ids.len() - fragments.len(),
            ids.len()
        );
    }
    Ok(Resolved { ids, fragments })
}
