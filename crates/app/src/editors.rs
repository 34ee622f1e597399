use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use metrics::counter;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use presshub_core::types::{Editor, EntityKind, Issue};

use crate::problem::ProblemResponse;
use crate::router::AppState;

/// Attributes accepted when registering an editor. Editors carry
/// client-supplied ids.
#[derive(Debug, Deserialize)]
pub struct EditorPayload {
    pub id: u32,
    pub name: String,
}

/// Attribute updates. Ids are immutable once registered.
#[derive(Debug, Deserialize)]
pub struct RenamePayload {
    pub name: String,
}

pub async fn list(State(state): State<AppState>) -> Json<Value> {
    let registry = state.read();
    Json(json!({ "editors": registry.get_editors() }))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<EditorPayload>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let mut registry = state.write();
    let editor = Editor::new(payload.id, payload.name);
    let body = json!({ "editor": &editor });
    registry.add_editor(editor).map_err(|err| {
        counter!("registry_admissions_total", "kind" => "editor", "result" => "duplicate")
            .increment(1);
        ProblemResponse::conflict(err)
    })?;
    counter!("registry_admissions_total", "kind" => "editor", "result" => "added").increment(1);
    info!(stage = "registry", editor_id = payload.id, "editor admitted");

    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn fetch(
    State(state): State<AppState>,
    Path(editor_id): Path<u32>,
) -> Result<Json<Value>, ProblemResponse> {
    let registry = state.read();
    let editor = registry
        .get_editor(editor_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Editor, editor_id))?;
    Ok(Json(json!({ "editor": editor })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(editor_id): Path<u32>,
    Json(payload): Json<RenamePayload>,
) -> Result<Json<Value>, ProblemResponse> {
    let mut registry = state.write();
    let editor = registry
        .get_editor_mut(editor_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Editor, editor_id))?;
    editor.name = payload.name;
    Ok(Json(json!({ "editor": &*editor })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(editor_id): Path<u32>,
) -> Result<Json<Value>, ProblemResponse> {
    let mut registry = state.write();
    if !registry.delete_editor(editor_id) {
        return Err(ProblemResponse::not_found(EntityKind::Editor, editor_id));
    }
    counter!("registry_removals_total", "kind" => "editor").increment(1);
    info!(stage = "registry", editor_id, "editor removed");
    Ok(Json(json!({
        "message": format!("editor with id {editor_id} was removed")
    })))
}

/// Issues the editor was responsible for, resolved through the registry.
///
/// Worklist entries whose issue has since been removed along with its paper
/// are skipped.
pub async fn issues(
    State(state): State<AppState>,
    Path(editor_id): Path<u32>,
) -> Result<Json<Value>, ProblemResponse> {
    let registry = state.read();
    let editor = registry
        .get_editor(editor_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Editor, editor_id))?;
    let issues: Vec<&Issue> = editor
        .issues()
        .iter()
        .filter_map(|key| {
            registry
                .get_newspaper(key.paper_id)
                .and_then(|paper| paper.get_issue(key.issue_id))
        })
        .collect();
    Ok(Json(json!({ "issues": issues })))
}
