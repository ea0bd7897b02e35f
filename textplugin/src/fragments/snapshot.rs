// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::store::StoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_TEMP_ATTEMPTS: u32 = 100;

/// Read a YAML snapshot; a missing or blank file yields `None`.
pub(crate) fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|err| {
        StoreError::new(format!(
            "Failed to read snapshot '{}': {}",
            path.display(),
            err
        ))
    })?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    let decoded = serde_yaml::from_str(&content).map_err(|err| {
        StoreError::new(format!(
            "Failed to parse snapshot '{}': {}",
            path.display(),
            err
        ))
    })?;
    Ok(Some(decoded))
}

/// Write a YAML snapshot through a temp file and an atomic rename.
pub(crate) fn write_snapshot<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let content = serde_yaml::to_string(value)
        .map_err(|err| StoreError::new(format!("Failed to serialize snapshot: {}", err)))?;
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::new("Snapshot path has no parent directory"))?;
    let (mut file, temp_path) = create_temp_file(parent, path)?;

    let written = file
        .write_all(content.as_bytes())
        .and_then(|_| file.sync_all())
        .and_then(|_| fs::rename(&temp_path, path));
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::new(format!(
            "Failed to replace snapshot '{}': {}",
            path.display(),
            err
        )));
    }

    #[cfg(unix)]
    {
        if let Err(err) = fs::File::open(parent).and_then(|dir| dir.sync_all()) {
            log::warn!("Snapshot directory sync failed: {}", err);
        }
    }

    Ok(())
}

fn create_temp_file(parent: &Path, path: &Path) -> Result<(fs::File, PathBuf), StoreError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| StoreError::new("Snapshot file name is not valid UTF-8"))?;
    for attempt in 0..MAX_TEMP_ATTEMPTS {
        let temp_path = parent.join(format!(
            ".{}.tmp.{}.{}",
            file_name,
            std::process::id(),
            attempt
        ));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
        {
            Ok(file) => return Ok((file, temp_path)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(StoreError::new(format!(
                    "Failed to create temp snapshot file: {}",
                    err
                )));
            }
        }
    }
    Err(StoreError::new(
        "Failed to create temp snapshot file after multiple attempts",
    ))
}
