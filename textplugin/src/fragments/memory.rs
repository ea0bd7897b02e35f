// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::model::{Fragment, FragmentId, NewFragment};
use super::snapshot::{read_snapshot, write_snapshot};
use super::store::{FragmentStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    next_id: u64,
    #[serde(default)]
    fragments: BTreeMap<FragmentId, Fragment>,
}

impl StoreState {
    fn sibling_count(&self, fragment: &NewFragment) -> u32 {
        let count = self
            .fragments
            .values()
            .filter(|existing| {
                existing.placeholder == fragment.placeholder
                    && existing.language == fragment.language
                    && existing.parent == fragment.parent
            })
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn subtree(&self, roots: &[FragmentId]) -> HashSet<FragmentId> {
        let mut doomed: HashSet<FragmentId> = roots.iter().copied().collect();
        loop {
            let before = doomed.len();
            for fragment in self.fragments.values() {
                if let Some(parent) = fragment.parent {
                    if doomed.contains(&parent) {
                        doomed.insert(fragment.id);
                    }
                }
            }
            if doomed.len() == before {
                return doomed;
            }
        }
    }
}

/// Process-local fragment store, optionally mirrored to a YAML snapshot.
///
/// Mutations are staged on a copy of the state and only swapped in once the
/// snapshot (if any) has been written.
pub struct MemoryFragmentStore {
    state: RwLock<StoreState>,
    snapshot: Option<PathBuf>,
    queries: AtomicUsize,
}

impl MemoryFragmentStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                next_id: 1,
                fragments: BTreeMap::new(),
            }),
            snapshot: None,
            queries: AtomicUsize::new(0),
        }
    }

    /// Open a store backed by `path`, loading the existing snapshot when present.
    pub fn with_snapshot(path: PathBuf) -> Result<Self, StoreError> {
        let mut state: StoreState = read_snapshot(&path)?.unwrap_or_default();
        let highest = state.fragments.keys().next_back().map(|id| id.0).unwrap_or(0);
        state.next_id = state.next_id.max(highest + 1);
        log::debug!(
            "Loaded {} fragments from snapshot {}",
            state.fragments.len(),
            path.display()
        );
        Ok(Self {
            state: RwLock::new(state),
            snapshot: Some(path),
            queries: AtomicUsize::new(0),
        })
    }

    /// Number of read queries served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn reset_query_count(&self) {
        self.queries.store(0, Ordering::SeqCst);
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> Result<T, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let guard = self
            .state
            .read()
            .map_err(|_| StoreError::new("Fragment store lock poisoned"))?;
        Ok(f(&guard))
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| StoreError::new("Fragment store lock poisoned"))?;
        let mut staged = guard.clone();
        let outcome = f(&mut staged)?;
        if let Some(path) = &self.snapshot {
            write_snapshot(path, &staged)?;
        }
        *guard = staged;
        Ok(outcome)
    }
}

impl Default for MemoryFragmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentStore for MemoryFragmentStore {
    fn create(&self, fragment: NewFragment) -> Result<Fragment, StoreError> {
        self.write(|state| {
            if let Some(parent) = fragment.parent {
                if !state.fragments.contains_key(&parent) {
                    return Err(StoreError::not_found(parent));
                }
            }
            let id = FragmentId(state.next_id);
            state.next_id += 1;
            let created = Fragment {
                id,
                position: state.sibling_count(&fragment),
                placeholder: fragment.placeholder,
                language: fragment.language,
                parent: fragment.parent,
                plugin_type: fragment.plugin_type,
                state: fragment.state,
                body: fragment.body,
                data: fragment.data,
            };
            state.fragments.insert(id, created.clone());
            Ok(created)
        })
    }

    fn get(&self, id: FragmentId) -> Result<Option<Fragment>, StoreError> {
        self.read(|state| state.fragments.get(&id).cloned())
    }

    fn get_many(&self, ids: &[FragmentId]) -> Result<HashMap<FragmentId, Fragment>, StoreError> {
        self.read(|state| {
            ids.iter()
                .filter_map(|id| state.fragments.get(id).map(|f| (*id, f.clone())))
                .collect()
        })
    }

    fn update(&self, fragment: &Fragment) -> Result<(), StoreError> {
        self.write(|state| match state.fragments.get_mut(&fragment.id) {
            Some(existing) => {
                *existing = fragment.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(fragment.id)),
        })
    }

    fn delete(&self, ids: &[FragmentId]) -> Result<(), StoreError> {
        self.write(|state| {
            if let Some(missing) = ids.iter().find(|id| !state.fragments.contains_key(id)) {
                return Err(StoreError::not_found(*missing));
            }
            let doomed = state.subtree(ids);
            state.fragments.retain(|id, _| !doomed.contains(id));
            log::debug!("Deleted {} fragments", doomed.len());
            Ok(())
        })
    }

    fn children(&self, parent: FragmentId) -> Result<Vec<Fragment>, StoreError> {
        self.read(|state| {
            let mut children: Vec<Fragment> = state
                .fragments
                .values()
                .filter(|fragment| fragment.is_child_of(parent))
                .cloned()
                .collect();
            children.sort_by_key(|fragment| (fragment.position, fragment.id));
            children
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::model::{FragmentState, PlaceholderId};
    use serde_json::json;

    fn seeded() -> (MemoryFragmentStore, Fragment) {
        let store = MemoryFragmentStore::new();
        let text = store
            .create(NewFragment::text(PlaceholderId(1), "en", "Hello"))
            .expect("create text");
        (store, text)
    }

    #[test]
    fn create_assigns_ids_and_sibling_positions() {
        let (store, text) = seeded();
        let first = store
            .create(NewFragment::child(&text, "LinkPlugin", json!({})))
            .expect("first child");
        let second = store
            .create(NewFragment::child(&text, "LinkPlugin", json!({})))
            .expect("second child");
        assert_eq!(text.id, FragmentId(1));
        assert_eq!(first.id, FragmentId(2));
        assert_eq!(first.position, 0);
        assert_eq!(second.position, 1);
    }

    #[test]
    fn create_rejects_unknown_parent() {
        let store = MemoryFragmentStore::new();
        let orphan = NewFragment::ghost_text(PlaceholderId(1), "en").under(Some(FragmentId(77)));
        assert!(store.create(orphan).is_err());
        assert!(store.get(FragmentId(1)).expect("get").is_none());
    }

    #[test]
    fn delete_cascades_to_descendants() {
        let (store, text) = seeded();
        let child = store
            .create(NewFragment::child(&text, "TextPlugin", json!({})))
            .expect("child");
        let grandchild = store
            .create(NewFragment::child(&child, "LinkPlugin", json!({})))
            .expect("grandchild");

        store.delete(&[child.id]).expect("delete");

        assert!(store.get(child.id).expect("get").is_none());
        assert!(store.get(grandchild.id).expect("get").is_none());
        assert!(store.get(text.id).expect("get").is_some());
    }

    #[test]
    fn delete_with_unknown_id_changes_nothing() {
        let (store, text) = seeded();
        let child = store
            .create(NewFragment::child(&text, "LinkPlugin", json!({})))
            .expect("child");

        assert!(store.delete(&[child.id, FragmentId(999)]).is_err());
        assert!(store.get(child.id).expect("get").is_some());
    }

    #[test]
    fn get_many_counts_one_query() {
        let (store, text) = seeded();
        let ids: Vec<FragmentId> = (0..5)
            .map(|_| {
                store
                    .create(NewFragment::child(&text, "LinkPlugin", json!({})))
                    .expect("child")
                    .id
            })
            .collect();
        store.reset_query_count();
        let found = store.get_many(&ids).expect("get many");
        assert_eq!(found.len(), 5);
        assert_eq!(store.query_count(), 1);
    }

    #[test]
    fn descendants_lists_parents_first() {
        let (store, text) = seeded();
        let nested = store
            .create(NewFragment::child(&text, "TextPlugin", json!({})))
            .expect("nested");
        let leaf = store
            .create(NewFragment::child(&nested, "LinkPlugin", json!({})))
            .expect("leaf");
        let ids: Vec<FragmentId> = store
            .descendants(text.id)
            .expect("descendants")
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec![nested.id, leaf.id]);
    }

    #[test]
    fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fragments.yaml");
        let text_id = {
            let store = MemoryFragmentStore::with_snapshot(path.clone()).expect("open");
            let text = store
                .create(NewFragment::ghost_text(PlaceholderId(4), "de"))
                .expect("create");
            text.id
        };

        let reopened = MemoryFragmentStore::with_snapshot(path).expect("reopen");
        let loaded = reopened.get(text_id).expect("get").expect("present");
        assert_eq!(loaded.state, FragmentState::Ghost);
        assert_eq!(loaded.language, "de");

        let next = reopened
            .create(NewFragment::ghost_text(PlaceholderId(4), "de"))
            .expect("create after reopen");
        assert!(next.id > text_id);
    }
}
