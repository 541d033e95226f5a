//! Single-use anti-forgery tokens bound to the session.
//!
//! A token is minted on a safe request when the session has none, and is
//! removed as soon as an unsafe request presents it. A replayed token
//! therefore always finds an empty slot.

use base64::{Engine, engine::general_purpose::URL_SAFE};
use rand::Rng;
use thiserror::Error;

use crate::models::session::{SessionContext, SessionResult};

/// Form field carrying the token.
pub const CSRF_FORM_FIELD: &str = "csrf_token";

/// Request and response header carrying the token.
pub const CSRF_HEADER: &str = "x-csrf-token";

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum CsrfError {
    /// Token absent on either side or mismatched. The cases are not
    /// distinguished.
    #[error("CSRF Token is invalid")]
    Invalid,

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// 32 random bytes, URL-safe base64.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE.encode(bytes)
}

/// Compare two tokens without short-circuiting on the first differing byte.
#[must_use]
pub fn tokens_match(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Return the session's token, minting one if it has none.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn ensure_token(session: &SessionContext) -> SessionResult<String> {
    if let Some(token) = session.csrf_token().await? {
        return Ok(token);
    }
    let token = generate_token();
    session.set_csrf_token(&token).await?;
    Ok(token)
}

/// Replace the session's token with a fresh one.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn rotate_token(session: &SessionContext) -> SessionResult<String> {
    let token = generate_token();
    session.set_csrf_token(&token).await?;
    Ok(token)
}

/// Check a presented token against the session and spend it.
///
/// # Errors
///
/// Returns `CsrfError::Invalid` when either side is missing or they differ.
/// The session token is left in place on failure.
pub async fn consume(session: &SessionContext, presented: Option<&str>) -> Result<(), CsrfError> {
    let expected = session.csrf_token().await?;

    match (expected, presented) {
        (Some(expected), Some(presented)) if tokens_match(&expected, presented) => {
            session.remove_csrf_token().await?;
            Ok(())
        }
        _ => Err(CsrfError::Invalid),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::{MemoryStore, Session};

    use super::*;

    fn context() -> SessionContext {
        SessionContext::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    #[test]
    fn test_generated_tokens_are_url_safe_and_distinct() {
        let a = generate_token();
        let b = generate_token();

        assert_ne!(a, b);
        assert_eq!(URL_SAFE.decode(&a).unwrap().len(), TOKEN_BYTES);
        assert!(!a.contains('+') && !a.contains('/'));
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
        assert!(!tokens_match("", "a"));
    }

    #[tokio::test]
    async fn test_ensure_token_is_stable_until_consumed() {
        let ctx = context();
        let first = ensure_token(&ctx).await.unwrap();
        assert_eq!(ensure_token(&ctx).await.unwrap(), first);

        consume(&ctx, Some(&first)).await.unwrap();
        assert_ne!(ensure_token(&ctx).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_token_cannot_be_replayed() {
        let ctx = context();
        let token = ensure_token(&ctx).await.unwrap();

        consume(&ctx, Some(&token)).await.unwrap();
        assert!(matches!(
            consume(&ctx, Some(&token)).await,
            Err(CsrfError::Invalid)
        ));
    }

    #[tokio::test]
    async fn test_missing_or_wrong_token_is_rejected() {
        let ctx = context();
        assert!(matches!(
            consume(&ctx, Some("anything")).await,
            Err(CsrfError::Invalid)
        ));

        let token = ensure_token(&ctx).await.unwrap();
        assert!(matches!(consume(&ctx, None).await, Err(CsrfError::Invalid)));
        assert!(matches!(
            consume(&ctx, Some("forged")).await,
            Err(CsrfError::Invalid)
        ));

        // A failed attempt does not burn the real token
        consume(&ctx, Some(&token)).await.unwrap();
    }
}
