//! Authentication route handlers.
//!
//! Login, registration and logout. Browsers are signed in through the
//! session; JSON clients additionally receive a bearer token, both in the
//! body and as the `jwt_token` cookie.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration as CookieDuration};

use crate::error::{AppError, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::session::SessionContext;
use crate::models::user::User;
use crate::response::{self, JsonOrForm, ResponseMode};
use crate::services::auth::{JWT_COOKIE_NAME, SignedToken};
use crate::services::csrf::{self, CSRF_HEADER};
use crate::state::AppState;
use crate::validation::{LoginForm, RegisterForm};

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub csrf_token: String,
    pub errors: Vec<String>,
    pub signed_in: bool,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub csrf_token: String,
    pub errors: Vec<String>,
    pub signed_in: bool,
}

/// Body of a successful JSON login.
#[derive(Serialize)]
struct LoginPayload<'a> {
    #[serde(flatten)]
    token: &'a SignedToken,
    user: &'a User,
}

// =============================================================================
// Cookie helpers
// =============================================================================

fn jwt_cookie(token: &SignedToken, lifetime: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((JWT_COOKIE_NAME, token.token.clone()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(CookieDuration::seconds(lifetime.num_seconds()))
        .build()
}

fn expired_jwt_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((JWT_COOKIE_NAME, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(CookieDuration::ZERO)
        .build()
}

/// Append a `Set-Cookie` header, leaving the session cookie in place.
fn append_cookie(response: &mut Response, cookie: &Cookie<'_>) -> Result<(), AppError> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

/// Hand the freshly minted CSRF token to the client. The guard spent the
/// one this request carried, so without it the next request would need a
/// safe round trip first.
fn set_csrf_header(response: &mut Response, token: &str) -> Result<(), AppError> {
    let value = HeaderValue::from_str(token)
        .map_err(|e| AppError::Internal(format!("invalid CSRF header: {e}")))?;
    response.headers_mut().insert(CSRF_HEADER, value);
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(session: SessionContext) -> Result<Response, AppError> {
    let template = LoginTemplate {
        csrf_token: session.csrf_token().await?.unwrap_or_default(),
        errors: session.take_flash_error().await?.into_iter().collect(),
        signed_in: false,
    };
    Ok(template.into_response())
}

/// Handle login form submission.
///
/// On success the session id is rotated, the session is bound to the user
/// and a fresh CSRF token is minted and returned in `X-CSRF-Token`.
/// Browser failures are flashed and redirected back to the form, whose GET
/// mints the token the next attempt needs.
pub async fn login(
    State(state): State<AppState>,
    mode: ResponseMode,
    session: SessionContext,
    JsonOrForm(form): JsonOrForm<LoginForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = form.validate() {
        return Ok(super::fail(mode, &session, errors.into(), "/login").await);
    }

    let user = match state.auth().authenticate(&form.contact, &form.password).await {
        Ok(user) => user,
        Err(err) => {
            tracing::warn!(error = %err, "login failed");
            return Ok(super::fail(mode, &session, err.into(), "/login").await);
        }
    };

    session.rotate_id().await?;
    session.set_auth_user_id(user.id).await?;
    let csrf_token = csrf::rotate_token(&session).await?;

    set_sentry_user(&user.id, Some(user.username.as_str()));
    add_breadcrumb("auth", "User logged in", &[("user_id", user.id.to_string())]);
    tracing::info!(user_id = %user.id, "user logged in");

    if !mode.is_json() {
        let mut response = Redirect::to("/").into_response();
        set_csrf_header(&mut response, &csrf_token)?;
        return Ok(response);
    }

    let token = state.tokens().issue(&user)?;
    let payload = LoginPayload {
        token: &token,
        user: &user,
    };
    let mut response = response::success(StatusCode::OK, "Log in successful", payload);
    let cookie = jwt_cookie(
        &token,
        state.tokens().lifetime(),
        state.config().secure_cookies,
    );
    append_cookie(&mut response, &cookie)?;
    set_csrf_header(&mut response, &csrf_token)?;
    Ok(response)
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(session: SessionContext) -> Result<Response, AppError> {
    let template = RegisterTemplate {
        csrf_token: session.csrf_token().await?.unwrap_or_default(),
        errors: session.take_flash_error().await?.into_iter().collect(),
        signed_in: false,
    };
    Ok(template.into_response())
}

/// Handle registration form submission.
pub async fn register(
    State(state): State<AppState>,
    mode: ResponseMode,
    session: SessionContext,
    JsonOrForm(form): JsonOrForm<RegisterForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = form.validate() {
        return Ok(super::fail(mode, &session, errors.into(), "/register").await);
    }

    match state
        .auth()
        .register(&form.username, &form.email, &form.password)
        .await
    {
        Ok(_) if mode.is_json() => Ok(response::success_message(
            StatusCode::CREATED,
            "Registration successful",
        )),
        Ok(_) => Ok(Redirect::to("/login").into_response()),
        Err(err) => Ok(super::fail(mode, &session, err.into(), "/register").await),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Forget the caller: clear the session, move it to a new id, expire the
/// bearer cookie and mint a fresh CSRF token for the next form.
pub async fn logout(
    State(state): State<AppState>,
    mode: ResponseMode,
    session: SessionContext,
    RequireAuth(user): RequireAuth,
) -> Result<Response, AppError> {
    session.reset().await?;
    let csrf_token = csrf::rotate_token(&session).await?;

    clear_sentry_user();
    tracing::info!(user_id = %user.id, "user logged out");

    let mut response = if mode.is_json() {
        response::success_message(StatusCode::OK, "Logout successfully")
    } else {
        Redirect::to("/login").into_response()
    };
    append_cookie(&mut response, &expired_jwt_cookie(state.config().secure_cookies))?;
    set_csrf_header(&mut response, &csrf_token)?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_jwt_cookie_attributes() {
        let token = SignedToken {
            token: "header.payload.sig".to_string(),
            expires_at: Utc::now(),
        };
        let cookie = jwt_cookie(&token, chrono::Duration::hours(1), true).to_string();

        assert!(cookie.starts_with("jwt_token=header.payload.sig"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=3600"));
    }

    #[test]
    fn test_expired_cookie_clears_value() {
        let cookie = expired_jwt_cookie(false).to_string();

        assert!(cookie.starts_with("jwt_token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Secure"));
    }
}
