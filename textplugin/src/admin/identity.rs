// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::actions::Editor;
use crate::config::SecurityConfig;
use actix_web::HttpRequest;

/// Resolves who is behind an admin request. Authentication itself belongs to
/// the host; this only reads what the host already established.
pub trait IdentityProvider: Send + Sync {
    fn identify(&self, req: &HttpRequest) -> Option<Editor>;
}

/// Session from a cookie, user from a header set by the authenticating proxy.
pub struct HeaderIdentityProvider {
    session_cookie: String,
    user_header: String,
}

impl HeaderIdentityProvider {
    pub fn new(security: &SecurityConfig) -> Self {
        Self {
            session_cookie: security.session_cookie.clone(),
            user_header: security.user_header.clone(),
        }
    }
}

impl IdentityProvider for HeaderIdentityProvider {
    fn identify(&self, req: &HttpRequest) -> Option<Editor> {
        let cookie = req.cookie(&self.session_cookie)?;
        let session = cookie.value().trim();
        if session.is_empty() {
            return None;
        }
        let user = req
            .headers()
            .get(self.user_header.as_str())?
            .to_str()
            .ok()?
            .trim();
        if user.is_empty() {
            return None;
        }
        Some(Editor::new(session, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    fn provider() -> HeaderIdentityProvider {
        HeaderIdentityProvider::new(&SecurityConfig {
            secret_key: "0123456789abcdef0123456789abcdef".to_string(),
            session_cookie: "sessionid".to_string(),
            user_header: "X-Editor-User".to_string(),
        })
    }

    #[test]
    fn reads_session_cookie_and_user_header() {
        let req = TestRequest::default()
            .cookie(Cookie::new("sessionid", "abc"))
            .insert_header(("X-Editor-User", "admin"))
            .to_http_request();
        assert_eq!(provider().identify(&req), Some(Editor::new("abc", "admin")));
    }

    #[test]
    fn both_parts_are_required() {
        let no_cookie = TestRequest::default()
            .insert_header(("X-Editor-User", "admin"))
            .to_http_request();
        assert_eq!(provider().identify(&no_cookie), None);

        let no_user = TestRequest::default()
            .cookie(Cookie::new("sessionid", "abc"))
            .to_http_request();
        assert_eq!(provider().identify(&no_user), None);

        let blank_user = TestRequest::default()
            .cookie(Cookie::new("sessionid", "abc"))
            .insert_header(("X-Editor-User", "  "))
            .to_http_request();
        assert_eq!(provider().identify(&blank_user), None);
    }
}
