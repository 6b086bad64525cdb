//! Request instrumentation shared by both listeners.
//!
//! Every request gets a fresh id that rides the extensions through the
//! stack. Failed responses are logged together with the diagnostic chain
//! their handler attached; the chain is consumed here so it never reaches
//! a client.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

const LOG_TARGET: &str = "foglio::http::response";

/// Correlation data for every layer below [`set_request_context`].
#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    fn fresh() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Outermost layer: tags the request and its eventual response with one id.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let context = RequestContext::fresh();
    request.extensions_mut().insert(context.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(context);
    response
}

/// Emits a warning for every 4xx and an error for every 5xx, folding in
/// the [`ErrorReport`] the handler left on the response.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let began = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map_or_else(String::new, |context| context.request_id.clone());

    let mut response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (source, chain) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = chain
        .first()
        .cloned()
        .unwrap_or_else(|| "no diagnostic available".to_string());
    let elapsed_ms = began.elapsed().as_millis();

    if status.is_server_error() {
        error!(
            target = LOG_TARGET,
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            query = uri.query().unwrap_or(""),
            elapsed_ms = elapsed_ms,
            source = source,
            detail = %detail,
            chain = ?chain,
            request_id = request_id,
            "request failed",
        );
    } else {
        warn!(
            target = LOG_TARGET,
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            query = uri.query().unwrap_or(""),
            elapsed_ms = elapsed_ms,
            source = source,
            detail = %detail,
            chain = ?chain,
            request_id = request_id,
            "client request error",
        );
    }

    response
}
