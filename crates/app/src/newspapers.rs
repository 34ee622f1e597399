use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use presshub_core::agency::Agency;
use presshub_core::types::{EntityKind, Issue, IssueKey, Newspaper};

use crate::problem::ProblemResponse;
use crate::router::AppState;

/// Attributes accepted when creating or updating a newspaper. The paper id
/// is allocated server-side and never taken from the payload.
#[derive(Debug, Deserialize)]
pub struct NewspaperPayload {
    pub name: String,
    pub frequency: u32,
    pub price: f64,
}

/// Attributes accepted when attaching an issue to a paper.
#[derive(Debug, Deserialize)]
pub struct IssuePayload {
    pub id: u32,
    pub name: String,
    pub releasedate: DateTime<Utc>,
    #[serde(default)]
    pub released: bool,
}

#[derive(Debug, Deserialize)]
pub struct AssignQuery {
    pub editor_id: u32,
}

#[derive(Debug, Deserialize)]
pub struct DeliverQuery {
    pub subscriber_id: u32,
}

fn validate(payload: &NewspaperPayload) -> Result<(), ProblemResponse> {
    if payload.frequency == 0 {
        return Err(ProblemResponse::new(
            StatusCode::BAD_REQUEST,
            "invalid_frequency",
            "frequency must be at least one day",
        ));
    }
    if payload.price < 0.0 {
        return Err(ProblemResponse::new(
            StatusCode::BAD_REQUEST,
            "invalid_price",
            "price must not be negative",
        ));
    }
    Ok(())
}

/// Samples a fresh paper id from a large id space, collision-checked
/// against the registry. Runs under the same write guard as the insert so
/// the id cannot be taken in between.
fn allocate_paper_id(registry: &Agency) -> u32 {
    let mut rng = rand::thread_rng();
    loop {
        let candidate = rng.gen_range(100..10_000_000);
        if registry.get_newspaper(candidate).is_none() {
            return candidate;
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NewspaperPayload>,
) -> Result<impl IntoResponse, ProblemResponse> {
    validate(&payload)?;

    let mut registry = state.write();
    let paper_id = allocate_paper_id(&registry);
    let paper = Newspaper::new(paper_id, payload.name, payload.frequency, payload.price);
    let body = json!({ "newspaper": &paper });
    registry.add_newspaper(paper).map_err(|err| {
        counter!("registry_admissions_total", "kind" => "newspaper", "result" => "duplicate")
            .increment(1);
        ProblemResponse::conflict(err)
    })?;
    counter!("registry_admissions_total", "kind" => "newspaper", "result" => "added").increment(1);
    info!(stage = "registry", paper_id, "newspaper admitted");

    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn list(State(state): State<AppState>) -> Json<Value> {
    let registry = state.read();
    Json(json!({ "newspapers": registry.all_newspapers() }))
}

pub async fn fetch(
    State(state): State<AppState>,
    Path(paper_id): Path<u32>,
) -> Result<Json<Value>, ProblemResponse> {
    let registry = state.read();
    let paper = registry
        .get_newspaper(paper_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Newspaper, paper_id))?;
    Ok(Json(json!({ "newspaper": paper })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(paper_id): Path<u32>,
    Json(payload): Json<NewspaperPayload>,
) -> Result<Json<Value>, ProblemResponse> {
    validate(&payload)?;

    let mut registry = state.write();
    let paper = registry
        .get_newspaper_mut(paper_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Newspaper, paper_id))?;
    paper.name = payload.name;
    paper.frequency = payload.frequency;
    paper.price = payload.price;
    Ok(Json(json!({ "newspaper": &*paper })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(paper_id): Path<u32>,
) -> Result<Json<Value>, ProblemResponse> {
    let mut registry = state.write();
    if !registry.remove_newspaper(paper_id) {
        return Err(ProblemResponse::not_found(EntityKind::Newspaper, paper_id));
    }
    counter!("registry_removals_total", "kind" => "newspaper").increment(1);
    info!(stage = "registry", paper_id, "newspaper removed");
    Ok(Json(json!({
        "message": format!("newspaper with id {paper_id} was removed")
    })))
}

pub async fn list_issues(
    State(state): State<AppState>,
    Path(paper_id): Path<u32>,
) -> Result<Json<Value>, ProblemResponse> {
    let registry = state.read();
    let paper = registry
        .get_newspaper(paper_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Newspaper, paper_id))?;
    Ok(Json(json!({ "issues": paper.issues() })))
}

pub async fn create_issue(
    State(state): State<AppState>,
    Path(paper_id): Path<u32>,
    Json(payload): Json<IssuePayload>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let mut registry = state.write();
    let paper = registry
        .get_newspaper_mut(paper_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Newspaper, paper_id))?;

    let issue = Issue::new(payload.id, payload.name, payload.releasedate, payload.released);
    paper.add_issue(issue).map_err(|err| {
        counter!("registry_admissions_total", "kind" => "issue", "result" => "duplicate")
            .increment(1);
        ProblemResponse::conflict(err)
    })?;
    counter!("registry_admissions_total", "kind" => "issue", "result" => "added").increment(1);
    info!(stage = "registry", paper_id, issue_id = payload.id, "issue attached");

    // Respond with the attached issue so the back-reference is visible.
    Ok((
        StatusCode::CREATED,
        Json(json!({ "issue": paper.issues().last() })),
    ))
}

pub async fn fetch_issue(
    State(state): State<AppState>,
    Path((paper_id, issue_id)): Path<(u32, u32)>,
) -> Result<Json<Value>, ProblemResponse> {
    let registry = state.read();
    let paper = registry
        .get_newspaper(paper_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Newspaper, paper_id))?;
    let issue = paper
        .get_issue(issue_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Issue, issue_id))?;
    Ok(Json(json!({ "issue": issue })))
}

pub async fn release_issue(
    State(state): State<AppState>,
    Path((paper_id, issue_id)): Path<(u32, u32)>,
) -> Result<Json<Value>, ProblemResponse> {
    let now = state.now();
    let mut registry = state.write();
    let paper = registry
        .get_newspaper_mut(paper_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Newspaper, paper_id))?;
    let outcome = paper
        .release_issue(issue_id, now)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Issue, issue_id))?;

    counter!("issue_releases_total", "result" => outcome.as_str()).increment(1);
    info!(
        stage = "registry",
        paper_id,
        issue_id,
        result = outcome.as_str(),
        "release requested"
    );
    Ok(Json(json!({ "issue_id": issue_id, "result": outcome })))
}

pub async fn assign_editor(
    State(state): State<AppState>,
    Path((paper_id, issue_id)): Path<(u32, u32)>,
    Query(query): Query<AssignQuery>,
) -> Result<Json<Value>, ProblemResponse> {
    let mut registry = state.write();
    let outcome = registry.assign_editor(IssueKey { paper_id, issue_id }, query.editor_id)?;

    counter!("editor_assignments_total", "result" => outcome.as_str()).increment(1);
    info!(
        stage = "registry",
        paper_id,
        issue_id,
        editor_id = query.editor_id,
        result = outcome.as_str(),
        "editor assigned"
    );
    Ok(Json(json!({
        "issue_id": issue_id,
        "editor_id": query.editor_id,
        "result": outcome
    })))
}

pub async fn deliver_issue(
    State(state): State<AppState>,
    Path((paper_id, issue_id)): Path<(u32, u32)>,
    Query(query): Query<DeliverQuery>,
) -> Result<Json<Value>, ProblemResponse> {
    let mut registry = state.write();
    let outcome = registry.deliver_issue(IssueKey { paper_id, issue_id }, query.subscriber_id)?;

    counter!("issue_deliveries_total", "result" => outcome.as_str(), "source" => "direct")
        .increment(1);
    info!(
        stage = "registry",
        paper_id,
        issue_id,
        subscriber_id = query.subscriber_id,
        result = outcome.as_str(),
        "delivery requested"
    );
    Ok(Json(json!({
        "issue_id": issue_id,
        "subscriber_id": query.subscriber_id,
        "result": outcome
    })))
}
