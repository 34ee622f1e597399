use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use presshub_core::types::{DomainError, EntityKind, MissingEntity};

/// RFC 7807 body carried by every error response.
#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    problem_type: &'static str,
    title: &'static str,
    detail: String,
}

pub struct ProblemResponse {
    status: StatusCode,
    body: ProblemDetails,
}

impl ProblemResponse {
    pub fn new<S: Into<String>>(status: StatusCode, problem_type: &'static str, detail: S) -> Self {
        Self {
            status,
            body: ProblemDetails {
                problem_type,
                title: status.canonical_reason().unwrap_or("error"),
                detail: detail.into(),
            },
        }
    }

    /// 409 for identifier collisions reported by the registry.
    pub fn conflict(err: DomainError) -> Self {
        Self::new(StatusCode::CONFLICT, "duplicate_identifier", err.to_string())
    }

    /// 404 for a missing entity of a known kind.
    pub fn not_found(kind: EntityKind, id: u32) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "unknown_entity",
            format!("{kind} with id {id} was not found"),
        )
    }
}

impl From<MissingEntity> for ProblemResponse {
    fn from(err: MissingEntity) -> Self {
        Self::not_found(err.kind, err.id)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}
