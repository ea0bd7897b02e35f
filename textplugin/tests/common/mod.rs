// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use serde_json::Value;
use std::sync::Arc;
use textplugin::admin;
use textplugin::app_state::AppState;
use textplugin::config::ValidatedConfig;
use textplugin::fragments::{
    Fragment, FragmentId, FragmentStore, MemoryFragmentStore, NewFragment, PlaceholderId,
};
use textplugin::util::test_config;

pub const EDITOR: &str = "admin";
pub const CONTRIBUTOR: &str = "contributor";

pub struct TestHarness {
    pub config: ValidatedConfig,
    pub store: Arc<MemoryFragmentStore>,
    pub app_state: web::Data<AppState>,
}

/// Session cookie and user header of one browser.
#[derive(Clone)]
pub struct EditorSession {
    pub session_id: String,
    pub user: String,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_state(test_config(), |state| state)
    }

    /// Build with a hook to adjust the state before it is shared.
    pub fn with_state(config: ValidatedConfig, adjust: impl FnOnce(AppState) -> AppState) -> Self {
        let store = Arc::new(MemoryFragmentStore::new());
        let state = AppState::new(&config, store.clone()).expect("app state");
        Self {
            config,
            store,
            app_state: web::Data::new(adjust(state)),
        }
    }

    pub fn session(&self, user: &str) -> EditorSession {
        EditorSession {
            session_id: uuid::Uuid::new_v4().to_string(),
            user: user.to_string(),
        }
    }

    pub fn text(&self, body: &str) -> Fragment {
        self.store
            .create(NewFragment::text(PlaceholderId(1), "en", body))
            .expect("create text")
    }

    pub fn child(&self, parent: &Fragment, plugin_type: &str, data: Value) -> Fragment {
        self.store
            .create(NewFragment::child(parent, plugin_type, data))
            .expect("create child")
    }

    pub fn set_body(&self, id: FragmentId, body: &str) {
        let mut fragment = self.fragment(id).expect("fragment exists");
        fragment.body = body.to_string();
        self.store.update(&fragment).expect("update body");
    }

    pub fn fragment(&self, id: FragmentId) -> Option<Fragment> {
        self.store.get(id).expect("store get")
    }

    pub fn token(&self, session: &EditorSession, id: FragmentId) -> String {
        self.app_state
            .tokens
            .issue(&session.session_id, &session.user, id)
    }

    pub fn app_bundle(&self) -> AppBundle {
        AppBundle {
            app_state: self.app_state.clone(),
            admin_path: self.config.admin.path.clone(),
        }
    }

    pub fn text_path(&self, rest: &str) -> String {
        format!("{}/text{}", self.config.admin.path, rest)
    }
}

/// Owned pieces of the harness an app factory needs.
#[derive(Clone)]
pub struct AppBundle {
    pub app_state: web::Data<AppState>,
    pub admin_path: String,
}

pub fn build_test_app(
    bundle: AppBundle,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let admin_path = bundle.admin_path;
    App::new()
        .app_data(bundle.app_state)
        .configure(move |cfg| admin::configure(cfg, &admin_path))
}

pub fn as_editor(
    req: actix_web::test::TestRequest,
    session: &EditorSession,
) -> actix_web::test::TestRequest {
    req.cookie(Cookie::new("sessionid", session.session_id.clone()))
        .insert_header(("X-Editor-User", session.user.clone()))
}

pub fn reference(id: FragmentId) -> String {
    format!(r#"<cms-plugin id="{}"></cms-plugin>"#, id)
}
