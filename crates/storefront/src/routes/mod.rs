//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database)
//!
//! # Public (CSRF guard only)
//! GET  /                       - Welcome message / storefront page
//! GET  /products               - Product listing
//! GET  /products/{id}          - Product detail
//!
//! # Guests only
//! GET  /login                  - Login page
//! POST /login                  - Login action (rate limited)
//! GET  /register               - Register page
//! POST /register               - Register action (rate limited)
//!
//! # Authenticated
//! POST /logout                 - Logout action
//! GET  /cart                   - Cart contents
//! POST /cart                   - Add one unit of a product
//! POST /cart/product/{product_id}/remove-one - Remove one unit
//! POST /cart/{item_id}/delete  - Remove a cart line
//! GET  /confirm-order          - Checkout preview
//! POST /checkout               - Clear the cart
//!
//! # Refresh after a POST
//! GET  /logout, /checkout, /cart/product/{product_id}/remove-one,
//!      /cart/{item_id}/delete  - Redirect home
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod home;
pub mod products;

use axum::{
    Router,
    extract::Request,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::error::AppError;
use crate::middleware::{
    auth_rate_limiter, csrf_middleware, redirect_if_authenticated, request_id_middleware,
    require_auth, security_headers_middleware,
};
use crate::models::session::SessionContext;
use crate::response::{self, MAX_BODY_BYTES, ResponseMode};
use crate::state::AppState;

const NOT_FOUND_MESSAGE: &str = "the requested resource could not be found";
const METHOD_NOT_ALLOWED_MESSAGE: &str = "the method is not supported for this resource";

/// Pages and read-only endpoints anyone may call.
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/logout", get(home::redirect_home))
        .route("/checkout", get(home::redirect_home))
        .route(
            "/cart/product/{product_id}/remove-one",
            get(home::redirect_home),
        )
        .route("/cart/{item_id}/delete", get(home::redirect_home))
        .route_layer(from_fn(csrf_middleware))
}

/// Login and registration, closed to signed-in users.
fn guest_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route_layer(from_fn(csrf_middleware))
        .route_layer(from_fn(redirect_if_authenticated))
}

/// Everything that needs an identity.
fn authenticated_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/logout", post(auth::logout))
        .route("/cart", get(cart::show).post(cart::add))
        .route(
            "/cart/product/{product_id}/remove-one",
            post(cart::remove_one),
        )
        .route("/cart/{item_id}/delete", post(cart::delete))
        .route("/confirm-order", get(cart::confirm_order))
        .route("/checkout", post(cart::checkout))
        .route_layer(from_fn(csrf_middleware))
        .route_layer(from_fn_with_state(state, require_auth))
}

/// Build the storefront application.
///
/// The session layer is passed in so tests can run against
/// `tower_sessions::MemoryStore`.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(public_routes())
        .merge(guest_routes())
        .merge(authenticated_routes(state.clone()))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(trace_layer)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

async fn not_found(request: Request) -> Response {
    tracing::debug!(method = %request.method(), path = %request.uri().path(), "no route");
    AppError::NotFound(NOT_FOUND_MESSAGE.to_string()).into_response()
}

async fn method_not_allowed() -> Response {
    response::error::<()>(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE, None)
}

/// Queue `message` for the next rendered page and redirect.
pub(crate) async fn flash_redirect(session: &SessionContext, message: &str, to: &str) -> Response {
    if let Err(e) = session.set_flash_error(message).await {
        return AppError::from(e).into_response();
    }
    Redirect::to(to).into_response()
}

/// Answer a failed request. JSON clients get the error envelope; browsers
/// get the message flashed and are sent to `redirect_to`.
pub(crate) async fn fail(
    mode: ResponseMode,
    session: &SessionContext,
    err: AppError,
    redirect_to: &str,
) -> Response {
    if mode.is_json() {
        return err.into_response();
    }

    err.report();
    let message = match &err {
        AppError::Validation(errors) => errors.messages().join("; "),
        _ => err.public_message(),
    };
    flash_redirect(session, &message, redirect_to).await
}
