//! Authentication middleware and extractors.
//!
//! `require_auth` resolves the caller's identity from a bearer token (cookie
//! first, then the `Authorization` header) or, failing that, from the
//! session. Handlers behind it read the result with [`RequireAuth`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::cookie::Cookie;

use dessert_shop_core::UserId;

use super::csrf::header_token;
use crate::error::{AppError, set_sentry_user};
use crate::models::session::SessionContext;
use crate::response::ResponseMode;
use crate::services::auth::JWT_COOKIE_NAME;
use crate::services::csrf::tokens_match;
use crate::state::AppState;

const MISSING_CREDENTIALS: &str = "authentication credentials were not found";
const ALREADY_AUTHENTICATED: &str = "authentication credentials have been verified";
const INVALID_CSRF_BINDING: &str = "Invalid CSRF Token";

/// How the caller proved who they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    Bearer,
    Session,
}

/// The identity resolved for this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub source: AuthSource,
}

/// Extractor for handlers behind [`require_auth`].
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, user {}!", user.id)
/// }
/// ```
pub struct RequireAuth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized(MISSING_CREDENTIALS.to_string()))
    }
}

/// Bearer token from the `jwt_token` cookie.
fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .flatten()
        .find(|cookie| cookie.name() == JWT_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Bearer token from `Authorization: Bearer <token>`.
fn authorization_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Some((*token).to_string()),
        _ => None,
    }
}

/// Browsers are sent to the login page with the reason flashed; JSON
/// clients get the error envelope.
async fn unauthenticated(mode: ResponseMode, session: &SessionContext, err: AppError) -> Response {
    if mode.is_json() {
        return err.into_response();
    }

    if let Err(e) = session.set_flash_error(&err.public_message()).await {
        return AppError::from(e).into_response();
    }
    Redirect::to("/login").into_response()
}

/// Require an authenticated caller.
///
/// A presented token is authoritative: if it fails validation the request
/// is rejected without falling back to the session. A valid token also has
/// to carry the session's CSRF token in `X-CSRF-Token`, on every method, and
/// re-points the session at the token's user. A session holding no token
/// (none minted yet, or the last one spent) rejects every bearer request
/// until a safe request on a public route mints one.
///
/// A bearer request that fails this binding is a 401 ("Invalid CSRF Token"),
/// unlike the 403 the CSRF guard returns for a bad token on the session
/// path. The binding is part of authenticating the bearer, so it fails as
/// authentication.
pub async fn require_auth(
    State(state): State<AppState>,
    session: SessionContext,
    mut request: Request,
    next: Next,
) -> Response {
    let mode = ResponseMode::from_headers(request.headers());
    let headers = request.headers();
    let presented = cookie_token(headers).or_else(|| authorization_token(headers));

    let user = if let Some(token) = presented {
        let claims = match state.tokens().validate(&token) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::warn!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    error = %err,
                    "bearer token rejected"
                );
                return unauthenticated(mode, &session, err.into()).await;
            }
        };

        let expected = match session.csrf_token().await {
            Ok(expected) => expected,
            Err(e) => return AppError::from(e).into_response(),
        };
        // A session with no token binds nothing, whatever the method
        let bound = expected
            .zip(header_token(request.headers()))
            .is_some_and(|(expected, presented)| tokens_match(&expected, &presented));
        if !bound {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                user_id = %claims.user_id,
                "bearer request without matching CSRF token"
            );
            let err = AppError::Unauthorized(INVALID_CSRF_BINDING.to_string());
            return unauthenticated(mode, &session, err).await;
        }

        if let Err(e) = session.set_auth_user_id(claims.user_id).await {
            return AppError::from(e).into_response();
        }
        set_sentry_user(&claims.user_id, Some(&claims.username));

        AuthenticatedUser {
            id: claims.user_id,
            source: AuthSource::Bearer,
        }
    } else {
        match session.auth_user_id().await {
            Ok(Some(id)) => AuthenticatedUser {
                id,
                source: AuthSource::Session,
            },
            Ok(None) => {
                let err = AppError::Unauthorized(MISSING_CREDENTIALS.to_string());
                return unauthenticated(mode, &session, err).await;
            }
            Err(e) => return AppError::from(e).into_response(),
        }
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Keep signed-in users away from the login and registration pages.
pub async fn redirect_if_authenticated(
    session: SessionContext,
    request: Request,
    next: Next,
) -> Response {
    match session.auth_user_id().await {
        Ok(None) => next.run(request).await,
        Ok(Some(_)) => {
            if ResponseMode::from_headers(request.headers()).is_json() {
                AppError::Forbidden(ALREADY_AUTHENTICATED.to_string()).into_response()
            } else {
                Redirect::to("/").into_response()
            }
        }
        Err(e) => AppError::from(e).into_response(),
    }
}
