// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::PermissionsConfig;
use crate::fragments::{Fragment, PlaceholderId};
use std::collections::HashSet;

/// Host permission checks consulted by the admin endpoints.
pub trait PermissionChecker: Send + Sync {
    fn has_add_permission(&self, user: &str, placeholder: PlaceholderId) -> bool;

    fn has_change_permission(&self, user: &str, fragment: &Fragment) -> bool;
}

/// Permissions taken from the `permissions` config section.
pub struct ConfiguredPermissions {
    editors: HashSet<String>,
    contributors: HashSet<String>,
}

impl ConfiguredPermissions {
    pub fn new(config: &PermissionsConfig) -> Self {
        Self {
            editors: config.editors.iter().cloned().collect(),
            contributors: config.contributors.iter().cloned().collect(),
        }
    }
}

impl PermissionChecker for ConfiguredPermissions {
    fn has_add_permission(&self, user: &str, _placeholder: PlaceholderId) -> bool {
        self.editors.contains(user) || self.contributors.contains(user)
    }

    fn has_change_permission(&self, user: &str, _fragment: &Fragment) -> bool {
        self.editors.contains(user)
    }
}
