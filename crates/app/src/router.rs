use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;

use presshub_core::agency::Agency;

use crate::{editors, newspapers, subscribers, telemetry};

/// Shared application state: the registry behind one lock, the metrics
/// handle and an injectable clock.
///
/// The registry is a single shared mutable resource; every handler takes
/// either the read or the write side of the lock for the duration of its
/// registry work and never holds a guard across an await point.
#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    registry: Arc<RwLock<Agency>>,
    clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle) -> Self {
        Self {
            metrics,
            registry: Arc::new(RwLock::new(Agency::new())),
            clock: Arc::new(Utc::now),
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    /// Shared read access to the registry. A poisoned lock only means a
    /// handler panicked mid-request; the registry itself stays usable.
    pub fn read(&self) -> RwLockReadGuard<'_, Agency> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive write access to the registry.
    pub fn write(&self) -> RwLockWriteGuard<'_, Agency> {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route(
            "/newspaper",
            get(newspapers::list).post(newspapers::create),
        )
        .route(
            "/newspaper/:paper_id",
            get(newspapers::fetch)
                .post(newspapers::update)
                .delete(newspapers::remove),
        )
        .route(
            "/newspaper/:paper_id/issue",
            get(newspapers::list_issues).post(newspapers::create_issue),
        )
        .route(
            "/newspaper/:paper_id/issue/:issue_id",
            get(newspapers::fetch_issue),
        )
        .route(
            "/newspaper/:paper_id/issue/:issue_id/release",
            post(newspapers::release_issue),
        )
        .route(
            "/newspaper/:paper_id/issue/:issue_id/editor",
            post(newspapers::assign_editor),
        )
        .route(
            "/newspaper/:paper_id/issue/:issue_id/deliver",
            post(newspapers::deliver_issue),
        )
        .route("/editor", get(editors::list).post(editors::create))
        .route(
            "/editor/:editor_id",
            get(editors::fetch)
                .post(editors::update)
                .delete(editors::remove),
        )
        .route("/editor/:editor_id/issues", get(editors::issues))
        .route(
            "/subscriber",
            get(subscribers::list).post(subscribers::create),
        )
        .route(
            "/subscriber/:subscriber_id",
            get(subscribers::fetch)
                .post(subscribers::update)
                .delete(subscribers::remove),
        )
        .route(
            "/subscriber/:subscriber_id/subscribe",
            post(subscribers::subscribe),
        )
        .route("/subscriber/:subscriber_id/stats", get(subscribers::stats))
        .route(
            "/subscriber/:subscriber_id/missingissues",
            get(subscribers::missing_issues),
        )
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .unwrap()
}
