// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod actions;
pub mod admin;
pub mod app_state;
pub mod config;
pub mod error;
pub mod fragments;
pub mod logging;
pub mod permissions;
pub mod plugins;
pub mod render;
pub mod resolver;
pub mod rewrite;
pub mod sanitizer;
pub mod tags;
pub mod templates;
pub mod token;
pub mod translation;
pub mod util;
