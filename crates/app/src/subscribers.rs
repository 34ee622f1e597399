use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use metrics::counter;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use presshub_core::types::{EntityKind, Subscriber};

use crate::problem::ProblemResponse;
use crate::router::AppState;

/// Attributes accepted when registering a subscriber. Subscribers carry
/// client-supplied ids.
#[derive(Debug, Deserialize)]
pub struct SubscriberPayload {
    pub id: u32,
    pub name: String,
}

/// Attribute updates. Ids are immutable once registered.
#[derive(Debug, Deserialize)]
pub struct RenamePayload {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeQuery {
    pub paper_id: u32,
}

pub async fn list(State(state): State<AppState>) -> Json<Value> {
    let registry = state.read();
    Json(json!({ "subscribers": registry.get_subscribers() }))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<SubscriberPayload>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let mut registry = state.write();
    let subscriber = Subscriber::new(payload.id, payload.name);
    let body = json!({ "subscriber": &subscriber });
    registry.add_subscriber(subscriber).map_err(|err| {
        counter!("registry_admissions_total", "kind" => "subscriber", "result" => "duplicate")
            .increment(1);
        ProblemResponse::conflict(err)
    })?;
    counter!("registry_admissions_total", "kind" => "subscriber", "result" => "added").increment(1);
    info!(stage = "registry", subscriber_id = payload.id, "subscriber admitted");

    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn fetch(
    State(state): State<AppState>,
    Path(subscriber_id): Path<u32>,
) -> Result<Json<Value>, ProblemResponse> {
    let registry = state.read();
    let subscriber = registry
        .get_subscriber(subscriber_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Subscriber, subscriber_id))?;
    Ok(Json(json!({ "subscriber": subscriber })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(subscriber_id): Path<u32>,
    Json(payload): Json<RenamePayload>,
) -> Result<Json<Value>, ProblemResponse> {
    let mut registry = state.write();
    let subscriber = registry
        .get_subscriber_mut(subscriber_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Subscriber, subscriber_id))?;
    subscriber.name = payload.name;
    Ok(Json(json!({ "subscriber": &*subscriber })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(subscriber_id): Path<u32>,
) -> Result<Json<Value>, ProblemResponse> {
    let mut registry = state.write();
    if !registry.remove_subscriber(subscriber_id) {
        return Err(ProblemResponse::not_found(
            EntityKind::Subscriber,
            subscriber_id,
        ));
    }
    counter!("registry_removals_total", "kind" => "subscriber").increment(1);
    info!(stage = "registry", subscriber_id, "subscriber removed");
    Ok(Json(json!({
        "message": format!("subscriber with id {subscriber_id} was removed")
    })))
}

pub async fn subscribe(
    State(state): State<AppState>,
    Path(subscriber_id): Path<u32>,
    Query(query): Query<SubscribeQuery>,
) -> Result<Json<Value>, ProblemResponse> {
    let mut registry = state.write();
    registry.subscribe(subscriber_id, query.paper_id)?;

    info!(
        stage = "registry",
        subscriber_id,
        paper_id = query.paper_id,
        "subscription recorded"
    );
    Ok(Json(json!({
        "message": format!(
            "subscriber {subscriber_id} was subscribed to newspaper {}",
            query.paper_id
        )
    })))
}

pub async fn stats(
    State(state): State<AppState>,
    Path(subscriber_id): Path<u32>,
) -> Result<Json<Value>, ProblemResponse> {
    let registry = state.read();
    let stats = registry
        .subscriber_stats(subscriber_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Subscriber, subscriber_id))?;
    Ok(Json(json!({ "stats": stats })))
}

/// Catch-up delivery: reports the issues delivered by this call, so the
/// endpoint is intentionally not idempotent.
pub async fn missing_issues(
    State(state): State<AppState>,
    Path(subscriber_id): Path<u32>,
) -> Result<Json<Value>, ProblemResponse> {
    let mut registry = state.write();
    let outcome = registry
        .deliver_missing_issues(subscriber_id)
        .ok_or_else(|| ProblemResponse::not_found(EntityKind::Subscriber, subscriber_id))?;

    let delivered = outcome.delivered_count();
    if delivered > 0 {
        counter!("issue_deliveries_total", "result" => "delivered", "source" => "catchup")
            .increment(delivered as u64);
        counter!("catchup_runs_total", "result" => "delivered").increment(1);
    } else {
        counter!("catchup_runs_total", "result" => "none_missing").increment(1);
    }
    info!(
        stage = "registry",
        subscriber_id, delivered, "catch-up delivery run"
    );
    Ok(Json(json!(outcome)))
}
