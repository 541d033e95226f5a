//! Session-backed request context.
//!
//! The session blob holds a handful of scalar fields. `SessionContext` is the
//! only code that knows their keys; handlers and guards receive it explicitly
//! instead of reaching into the raw `tower_sessions::Session`.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use chrono::Utc;
use tower_sessions::Session;

use dessert_shop_core::UserId;

/// Session keys.
pub mod keys {
    /// Authenticated user id.
    pub const AUTH_USER_ID: &str = "auth_user_id";

    /// Current anti-forgery token, removed once used.
    pub const CSRF_TOKEN: &str = "csrf_token";

    /// One-shot error message for the next rendered page.
    pub const FLASH_ERROR: &str = "flash_error";

    /// First safe request seen, epoch milliseconds.
    pub const CREATED_AT: &str = "created_at";

    /// Most recent safe request, epoch milliseconds.
    pub const LAST_SEEN: &str = "last_seen";
}

pub type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Typed access to the per-browser session.
///
/// Writes are last-writer-wins: two concurrent requests from one browser
/// may overwrite each other's changes.
#[derive(Clone, Debug)]
pub struct SessionContext {
    session: Session,
}

impl SessionContext {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn auth_user_id(&self) -> SessionResult<Option<UserId>> {
        self.session.get(keys::AUTH_USER_ID).await
    }

    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set_auth_user_id(&self, id: UserId) -> SessionResult<()> {
        self.session.insert(keys::AUTH_USER_ID, id).await
    }

    /// Rotate the session id, keeping its data. Called on login so a
    /// pre-authentication id cannot be reused.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the new id.
    pub async fn rotate_id(&self) -> SessionResult<()> {
        self.session.cycle_id().await
    }

    /// Forget everything and move to a fresh id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the new id.
    pub async fn reset(&self) -> SessionResult<()> {
        self.session.clear().await;
        self.session.cycle_id().await
    }

    // =========================================================================
    // CSRF token
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn csrf_token(&self) -> SessionResult<Option<String>> {
        self.session.get(keys::CSRF_TOKEN).await
    }

    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set_csrf_token(&self, token: &str) -> SessionResult<()> {
        self.session.insert(keys::CSRF_TOKEN, token).await
    }

    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn remove_csrf_token(&self) -> SessionResult<()> {
        self.session.remove::<String>(keys::CSRF_TOKEN).await?;
        Ok(())
    }

    // =========================================================================
    // Flash messages
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set_flash_error(&self, message: &str) -> SessionResult<()> {
        self.session.insert(keys::FLASH_ERROR, message).await
    }

    /// Read and clear the flash message.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn take_flash_error(&self) -> SessionResult<Option<String>> {
        self.session.remove(keys::FLASH_ERROR).await
    }

    // =========================================================================
    // Bookkeeping
    // =========================================================================

    /// Stamp `last_seen`, and `created_at` on the first visit.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn touch(&self) -> SessionResult<()> {
        let now = Utc::now().timestamp_millis();
        if self.session.get::<i64>(keys::CREATED_AT).await?.is_none() {
            self.session.insert(keys::CREATED_AT, now).await?;
        }
        self.session.insert(keys::LAST_SEEN, now).await
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self::new(session))
    }
}
