//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded into the span)
//! 4. Security headers
//! 5. Session layer (tower-sessions)
//! 6. Request body limit
//!
//! Per route group, outermost first:
//!
//! 7. `require_auth` or `redirect_if_authenticated`
//! 8. CSRF guard
//! 9. Rate limiting on login/registration posts (governor)

pub mod auth;
pub mod csrf;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{AuthSource, AuthenticatedUser, RequireAuth, redirect_if_authenticated, require_auth};
pub use csrf::csrf_middleware;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
