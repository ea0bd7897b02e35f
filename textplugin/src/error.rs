// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::fragments::StoreError;
use actix_web::http::StatusCode;
use std::error::Error;
use std::fmt;

pub const FORBIDDEN_BODY: &str = "<h1>403 Forbidden</h1>";
pub const BAD_REQUEST_BODY: &str = "Unable to process your request.";

/// Failure of a privileged action.
///
/// The detail of `MalformedRequest` is for logs only; callers only ever see
/// [`ActionError::public_message`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActionError {
    InvalidToken,
    MalformedRequest(String),
    Storage(StoreError),
}

impl ActionError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        ActionError::MalformedRequest(detail.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ActionError::InvalidToken => StatusCode::FORBIDDEN,
            ActionError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ActionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            ActionError::InvalidToken => FORBIDDEN_BODY,
            ActionError::MalformedRequest(_) => BAD_REQUEST_BODY,
            ActionError::Storage(_) => "Internal server error.",
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::InvalidToken => write!(f, "Invalid action token"),
            ActionError::MalformedRequest(detail) => write!(f, "Malformed request: {}", detail),
            ActionError::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl Error for ActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ActionError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ActionError {
    fn from(err: StoreError) -> Self {
        ActionError::Storage(err)
    }
}
