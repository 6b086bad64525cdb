use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::guard::Identity;

use super::public::HttpState;
use super::repo_error_to_http;

/// Header carrying the username of the already-authenticated caller.
/// Authentication happens at the reverse proxy; requests without the header
/// are treated as anonymous.
pub const IDENTITY_HEADER: &str = "x-forwarded-user";

pub async fn attach_identity(
    State(state): State<HttpState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let username = request
        .headers()
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let identity = match username {
        Some(username) => match state.users.find_by_username(&username).await {
            Ok(Some(user)) => Identity::User(user),
            Ok(None) => Identity::Anonymous,
            Err(err) => {
                return repo_error_to_http("infra::http::identity", err).into_response();
            }
        },
        None => Identity::Anonymous,
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}
