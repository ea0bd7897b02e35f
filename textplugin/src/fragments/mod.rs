// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod memory;
pub mod model;
mod snapshot;
pub mod store;

pub use memory::MemoryFragmentStore;
pub use model::{
    Fragment, FragmentId, FragmentState, NewFragment, PlaceholderId, TEXT_PLUGIN_TYPE,
};
pub use store::{FragmentStore, StoreError};
