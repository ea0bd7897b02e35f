// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod builtin;
mod registry;

pub use builtin::{LinkPlugin, PicturePlugin, SpacerPlugin, TextPlugin, register_builtin};
pub use registry::{
    DEFAULT_PREVIEW_DISABLED_TEXT, PluginRegistry, PluginRenderer, RenderError,
};
