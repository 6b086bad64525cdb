//! Page cache middleware.
//!
//! Serves cached feed pages for GET requests and buffers fresh 200
//! responses on the way out.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use super::{PageCache, keys::PageKey, store::CachedPage};
use crate::application::pagination::PageRequest;

/// Shared cache state for middleware.
#[derive(Clone)]
pub struct CacheState {
    pub store: Arc<PageCache>,
}

/// Largest response body the cache will buffer.
const MAX_CACHED_BODY_BYTES: usize = 1024 * 1024;

/// Middleware for feed page caching.
///
/// Only GET requests that return 200 OK are cached. The key is the route
/// path plus the resolved page number, so each page of a feed ages out
/// independently.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn page_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let page = resolve_page_number(request.uri().query());
    let key = PageKey::new(path, page);

    if let Some(cached) = cache.store.get(&key) {
        debug!(cache = "page", outcome = "hit", page, "serving cached page");
        return build_response(cached);
    }

    debug!(
        cache = "page",
        outcome = "miss",
        page,
        "page not cached, running handler"
    );

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    buffer_and_store(&cache.store, key, response).await
}

/// Buffer a fresh 200 response into the store and replay it to the client.
async fn buffer_and_store(store: &PageCache, key: PageKey, response: Response) -> Response {
    let (parts, body) = response.into_parts();
    // A body that cannot be buffered is replaced by a bare 500.
    let Ok(bytes) = axum::body::to_bytes(body, MAX_CACHED_BODY_BYTES).await else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.to_string(), value.to_string()))
        })
        .collect();
    store.insert(key, parts.status.as_u16(), headers, bytes.clone());

    Response::from_parts(parts, Body::from(bytes))
}

/// Resolve the `page` query parameter with the same fallback rules the feed
/// handlers use, so cached and rendered pages always agree on the key.
fn resolve_page_number(query: Option<&str>) -> u32 {
    let raw = query.and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == "page")
            .map(|(_, value)| value.into_owned())
    });
    PageRequest::from_param(raw.as_deref()).number()
}

/// Rehydrate a stored page into a full response.
fn build_response(cached: CachedPage) -> Response {
    use axum::http::HeaderValue;

    let mut builder = Response::builder().status(cached.status);
    for (name, value) in cached.headers {
        let Ok(value) = HeaderValue::from_str(&value) else {
            continue;
        };
        builder = builder.header(name, value);
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use time::OffsetDateTime;

    use super::*;

    #[test]
    fn page_number_defaults_to_one() {
        assert_eq!(resolve_page_number(None), 1);
        assert_eq!(resolve_page_number(Some("")), 1);
        assert_eq!(resolve_page_number(Some("page=oops")), 1);
        assert_eq!(resolve_page_number(Some("page=0")), 1);
    }

    #[test]
    fn page_number_parses_from_query() {
        assert_eq!(resolve_page_number(Some("page=2")), 2);
        assert_eq!(resolve_page_number(Some("other=x&page=7")), 7);
    }

    #[test]
    fn cached_response_is_rebuilt_with_headers() {
        let cached = CachedPage {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Bytes::from_static(b"{}"),
            stored_at: OffsetDateTime::UNIX_EPOCH,
        };
        let response = build_response(cached);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
    }
}
