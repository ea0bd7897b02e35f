// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::actions::Editor;
use crate::app_state::AppState;
use crate::error::{ActionError, FORBIDDEN_BODY};
use crate::fragments::{Fragment, FragmentId, PlaceholderId};
use crate::token::ActionTokens;
use actix_web::{HttpRequest, HttpResponse, Result, web};
use serde::Deserialize;
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig, admin_path: &str) {
    // Fixed segments go before the numeric id route.
    cfg.service(
        web::scope(&format!("{}/text", admin_path))
            .route("/add", web::get().to(add_text))
            .route("/add", web::post().to(add_text))
            .route("/delete-on-cancel", web::post().to(delete_on_cancel))
            .route("/render-plugin", web::get().to(render_plugin))
            .route("/{id:\\d+}", web::get().to(edit_text))
            .route("/{id:\\d+}", web::post().to(save_text)),
    );
}

#[derive(Deserialize)]
pub struct AddQuery {
    pub placeholder: u64,
    pub language: String,
    pub parent: Option<u64>,
}

#[derive(Deserialize)]
pub struct TextPath {
    pub id: u64,
}

#[derive(Deserialize)]
pub struct SaveForm {
    #[serde(default)]
    pub body: String,
}

#[derive(Deserialize)]
pub struct CancelForm {
    pub token: String,
    #[serde(default)]
    pub child_plugins: String,
}

#[derive(Deserialize)]
pub struct RenderPluginQuery {
    pub token: String,
    pub plugin: u64,
    pub text: Option<u64>,
}

/// Create a ghost text fragment and send the editor to it.
async fn add_text(
    req: HttpRequest,
    query: web::Query<AddQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(editor) = app_state.identity.identify(&req) else {
        return Ok(forbidden());
    };
    let placeholder = PlaceholderId(query.placeholder);
    if !app_state
        .permissions
        .has_add_permission(&editor.user_id, placeholder)
    {
        log::warn!("User {} may not add to placeholder {}", editor.user_id, placeholder);
        return Ok(forbidden());
    }

    match app_state
        .actions()
        .add_ghost(placeholder, &query.language, query.parent.map(FragmentId))
    {
        Ok(ghost) => {
            let base = req.path().trim_end_matches("/add");
            Ok(HttpResponse::Found()
                .insert_header(("Location", format!("{}/{}?delete-on-cancel", base, ghost.id)))
                .finish())
        }
        Err(err) => Ok(action_error_response(&err)),
    }
}

async fn edit_text(
    req: HttpRequest,
    path: web::Path<TextPath>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = FragmentId(path.id);
    let editor = match authorize_edit(&req, &app_state, id) {
        Ok(editor) => editor,
        Err(response) => return Ok(response),
    };

    match app_state.actions().open_editor(&editor, id) {
        Ok(view) => Ok(HttpResponse::Ok().json(view)),
        Err(err) => Ok(action_error_response(&err)),
    }
}

async fn save_text(
    req: HttpRequest,
    path: web::Path<TextPath>,
    form: web::Form<SaveForm>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = FragmentId(path.id);
    if let Err(response) = authorize_edit(&req, &app_state, id) {
        return Ok(response);
    }

    match app_state
        .actions()
        .save_body(&app_state.html_sanitizer, id, &form.body)
    {
        Ok(fragment) => Ok(HttpResponse::Ok().json(json!({
            "id": fragment.id,
            "body": fragment.body,
        }))),
        Err(err) => Ok(action_error_response(&err)),
    }
}

async fn delete_on_cancel(
    req: HttpRequest,
    form: web::Form<CancelForm>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(id) = ActionTokens::claimed_fragment(&form.token) else {
        return Ok(action_error_response(&ActionError::InvalidToken));
    };
    let editor = match authorize_edit(&req, &app_state, id) {
        Ok(editor) => editor,
        Err(response) => return Ok(response),
    };
    let children = match parse_child_ids(&form.child_plugins) {
        Ok(children) => children,
        Err(err) => return Ok(action_error_response(&err)),
    };

    match app_state.actions().cancel(&editor, &form.token, &children) {
        Ok(outcome) => {
            log::debug!("Cancel by {} handled: {:?}", editor.user_id, outcome);
            Ok(HttpResponse::NoContent().finish())
        }
        Err(err) => Ok(action_error_response(&err)),
    }
}

/// Admin preview of a single child, used by the editor after a child was
/// added or changed.
async fn render_plugin(
    req: HttpRequest,
    query: web::Query<RenderPluginQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(parent) = query
        .text
        .map(FragmentId)
        .or_else(|| ActionTokens::claimed_fragment(&query.token))
    else {
        return Ok(action_error_response(&ActionError::InvalidToken));
    };
    let editor = match authorize_edit(&req, &app_state, parent) {
        Ok(editor) => editor,
        Err(response) => return Ok(response),
    };

    match app_state
        .actions()
        .render_child(&editor, &query.token, parent, FragmentId(query.plugin))
    {
        Ok(html) => Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html)),
        Err(err) => Ok(action_error_response(&err)),
    }
}

/// Identify the caller and check they may edit fragment `id`. Ghosts are
/// editable by whoever may add to their placeholder. A missing fragment is
/// refused like one the caller may not touch.
fn authorize_edit(
    req: &HttpRequest,
    app_state: &AppState,
    id: FragmentId,
) -> std::result::Result<Editor, HttpResponse> {
    let Some(editor) = app_state.identity.identify(req) else {
        return Err(forbidden());
    };
    let fragment = match app_state.store.get(id) {
        Ok(Some(fragment)) => fragment,
        Ok(None) => {
            log::debug!("User {} asked for missing fragment {}", editor.user_id, id);
            return Err(forbidden());
        }
        Err(err) => return Err(action_error_response(&ActionError::from(err))),
    };
    if !may_edit(app_state, &editor, &fragment) {
        log::warn!("User {} may not edit fragment {}", editor.user_id, id);
        return Err(forbidden());
    }
    Ok(editor)
}

fn may_edit(app_state: &AppState, editor: &Editor, fragment: &Fragment) -> bool {
    let permissions = &app_state.permissions;
    permissions.has_change_permission(&editor.user_id, fragment)
        || (fragment.is_ghost()
            && permissions.has_add_permission(&editor.user_id, fragment.placeholder))
}

fn parse_child_ids(raw: &str) -> std::result::Result<Vec<FragmentId>, ActionError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            FragmentId::parse(part)
                .ok_or_else(|| ActionError::malformed(format!("Invalid child id '{}'", part)))
        })
        .collect()
}

fn forbidden() -> HttpResponse {
    HttpResponse::Forbidden()
        .content_type("text/html; charset=utf-8")
        .body(FORBIDDEN_BODY)
}

fn action_error_response(err: &ActionError) -> HttpResponse {
    match err {
        ActionError::Storage(inner) => log::error!("Fragment store failure: {}", inner),
        ActionError::MalformedRequest(detail) => log::debug!("Rejected request: {}", detail),
        ActionError::InvalidToken => {}
    }
    HttpResponse::build(err.status_code())
        .content_type("text/html; charset=utf-8")
        .body(err.public_message())
}
