//! Request pipeline layers that run ahead of the dispatch table.

use crate::cache::{is_cacheable_path, request_url, CACHE_HIT_HEADER};
use crate::error::AppError;
use crate::response::{json_bytes, json_response, Envelope, JSON_CONTENT_TYPE};
use crate::state::AppState;
use crate::tenant::TenantContext;
use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;

/// Stamp CORS and cache-control on every response, and the JSON content type on
/// non-empty bodies that lack one.
pub async fn apply_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let empty_body = response.body().size_hint().exact() == Some(0);
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("HEAD, GET"),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, must-revalidate, max-age=60"),
    );
    if !empty_body {
        headers
            .entry(header::CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(JSON_CONTENT_TYPE));
    }
    response
}

/// GET only; everything else is 405 before any route is consulted.
pub async fn reject_non_get(request: Request, next: Next) -> Response {
    if request.method() != Method::GET {
        tracing::debug!(method = %request.method(), path = %request.uri().path(), "method rejected");
        return AppError::MethodNotAllowed.into_response();
    }
    next.run(request).await
}

/// Pick the tenant connection from the path prefix and attach it to this request only.
pub async fn select_tenant(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let scope = state.tenants.select(request.uri().path());
    tracing::debug!(tenant = %scope.key(), path_info = %scope.path_info, "connection selected");
    request.extensions_mut().insert(scope);
    next.run(request).await
}

/// Serve stored payloads on hit; store 200 responses on miss.
pub async fn response_cache(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let eligible = state.cache.is_enabled()
        && request
            .extensions()
            .get::<TenantContext>()
            .is_some_and(|scope| is_cacheable_path(&scope.path_info));
    if !eligible {
        return next.run(request).await;
    }

    let url = request_url(&request);
    if let Some(entry) = state.cache.lookup(&url).await {
        let mut response = json_bytes(StatusCode::OK, entry.payload);
        response
            .headers_mut()
            .insert(CACHE_HIT_HEADER, HeaderValue::from_static("true"));
        return response;
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }
    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => return AppError::Internal(format!("reading response body: {}", e)).into_response(),
    };
    state.cache.store(&url, bytes.clone(), state.cache.ttl()).await;
    Response::from_parts(parts, Body::from(bytes))
}

/// Where a slash-less path should be redirected, if at all. A query string suppresses the redirect.
pub fn redirect_target(mount: &str, path_info: &str, query: Option<&str>) -> Option<String> {
    if query.is_some_and(|q| !q.is_empty()) {
        return None;
    }
    if path_info.len() < 2 || !path_info.starts_with('/') || path_info.ends_with('/') {
        return None;
    }
    Some(format!("{}{}/", mount, path_info))
}

/// `/foo` → 302 `/foo/` when there is no query string; otherwise fall through to the routes.
pub async fn normalize_trailing_slash(request: Request, next: Next) -> Response {
    let target = request.extensions().get::<TenantContext>().and_then(|scope| {
        redirect_target(&scope.mount, &scope.path_info, request.uri().query())
    });
    if let Some(location) = target {
        return (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
    }
    next.run(request).await
}

/// Panics become the generic 500 envelope.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "handler panicked");
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &Envelope::<serde_json::Value>::failure("server error"),
    )
}
