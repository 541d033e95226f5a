//! CSRF guard.
//!
//! Safe requests (`GET`, `HEAD`, `OPTIONS`) make sure the session holds a
//! token and echo it in the `X-CSRF-Token` response header. Every other
//! method must present the token, either as the `csrf_token` form field or
//! in the header. A matching token is spent, and the session stays without
//! one until the next safe request mints a replacement.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, Method, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::error::AppError;
use crate::models::session::SessionContext;
use crate::response::{MAX_BODY_BYTES, ResponseMode};
use crate::services::csrf::{self, CSRF_FORM_FIELD, CSRF_HEADER, CsrfError};

/// Flash message shown to browsers after a rejected form post.
pub const CSRF_FLASH_MESSAGE: &str = "Invalid form submission. Please try again.";

#[must_use]
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Token from a urlencoded body.
fn form_token(headers: &HeaderMap, body: &[u8]) -> Option<String> {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if !is_form {
        return None;
    }

    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == CSRF_FORM_FIELD)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Token from the `X-CSRF-Token` request header.
#[must_use]
pub fn header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn with_token_header(mut response: Response, token: &str) -> Response {
    if !response.headers().contains_key(CSRF_HEADER)
        && let Ok(value) = HeaderValue::from_str(token)
    {
        response.headers_mut().insert(CSRF_HEADER, value);
    }
    response
}

/// Session bookkeeping and token issuance for safe requests, token
/// verification for everything else.
pub async fn csrf_middleware(session: SessionContext, request: Request, next: Next) -> Response {
    if is_safe_method(request.method()) {
        return issue(session, request, next)
            .await
            .unwrap_or_else(IntoResponse::into_response);
    }

    verify(session, request, next)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

async fn issue(session: SessionContext, request: Request, next: Next) -> Result<Response, AppError> {
    session.touch().await?;
    let token = csrf::ensure_token(&session).await?;

    let response = next.run(request).await;
    Ok(with_token_header(response, &token))
}

async fn verify(session: SessionContext, request: Request, next: Next) -> Result<Response, AppError> {
    let mode = ResponseMode::from_headers(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let (parts, body) = request.into_parts();
    let bytes: Bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::BadRequest("request body too large".to_string()))?;

    let presented = form_token(&parts.headers, &bytes).or_else(|| header_token(&parts.headers));
    let request = Request::from_parts(parts, Body::from(bytes));

    match csrf::consume(&session, presented.as_deref()).await {
        Ok(()) => {}
        Err(CsrfError::Invalid) => {
            tracing::warn!(%method, %path, "CSRF token validation failed");
            return reject(mode, &session, &path).await;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(next.run(request).await)
}

async fn reject(
    mode: ResponseMode,
    session: &SessionContext,
    path: &str,
) -> Result<Response, AppError> {
    if mode.is_json() {
        return Err(CsrfError::Invalid.into());
    }

    session.set_flash_error(CSRF_FLASH_MESSAGE).await?;
    Ok(Redirect::to(path).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers
    }

    #[test]
    fn test_form_token_is_read_from_urlencoded_body() {
        let token = form_token(&form_headers(), b"productId=5&csrf_token=abc%2Bdef");
        assert_eq!(token.as_deref(), Some("abc+def"));
    }

    #[test]
    fn test_form_token_ignored_for_json_bodies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        assert_eq!(form_token(&headers, b"csrf_token=abc"), None);
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        assert_eq!(form_token(&form_headers(), b"csrf_token="), None);

        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER, HeaderValue::from_static(""));
        assert_eq!(header_token(&headers), None);
    }

    #[test]
    fn test_safe_methods() {
        assert!(is_safe_method(&Method::GET));
        assert!(is_safe_method(&Method::HEAD));
        assert!(is_safe_method(&Method::OPTIONS));
        assert!(!is_safe_method(&Method::POST));
        assert!(!is_safe_method(&Method::DELETE));
    }
}
