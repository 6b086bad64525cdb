//! HTTP surfaces: the public feed router and the private admin router,
//! plus the error plumbing both share.

mod admin;
mod identity;
mod middleware;
mod public;

pub use admin::{AdminState, build_admin_router};
pub use identity::IDENTITY_HEADER;
pub use public::{HttpState, build_router};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::Error as SqlxError;

use crate::application::error::{ErrorReport, HttpError};
use crate::application::repos::RepoError;

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    let Err(err) = result else {
        return StatusCode::NO_CONTENT.into_response();
    };
    let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
    ErrorReport::from_error("infra::http::db_health", StatusCode::SERVICE_UNAVAILABLE, &err)
        .attach(&mut response);
    response
}

/// One storage-error-to-status mapping for every surface, so a duplicate
/// username conflicts the same way a duplicate slug does.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    let (status, public, detail) = match err {
        RepoError::Duplicate { constraint } => {
            (StatusCode::CONFLICT, "Already exists", constraint)
        }
        RepoError::NotFound => (
            StatusCode::NOT_FOUND,
            "Not found",
            "no such record".to_string(),
        ),
        RepoError::InvalidInput { message } => (StatusCode::BAD_REQUEST, "Invalid input", message),
        RepoError::Integrity { message } => (StatusCode::CONFLICT, "Conflicting change", message),
        RepoError::Timeout => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Storage timeout",
            "storage timed out".to_string(),
        ),
        RepoError::Persistence(message) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage failure", message)
        }
    };
    HttpError::new(source, status, public, detail)
}
