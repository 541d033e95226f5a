//! Authentication service.
//!
//! Password login by email or username, account registration, and bearer
//! token issuance (see [`token`]).

mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use password::{DUMMY_PASSWORD_HASH, hash_password, validate_password, verify_password};
pub use token::{Claims, JWT_COOKIE_NAME, SignedToken, TokenError, TokenService};

use dessert_shop_core::{Email, LoginIdentifier, Username};

use crate::db::UserStore;
use crate::models::user::{NewUser, User};

/// Authentication service.
///
/// Handles user registration and password login.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore) -> Self {
        Self { users }
    }

    /// Check a password against the account named by `identifier`.
    ///
    /// An identifier containing `@` is looked up as an email, anything else
    /// as a username.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no account matches or the
    /// password is wrong. The two cases are not distinguished.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let identifier = LoginIdentifier::classify(identifier);

        let Some(credentials) = self.users.find_credentials(&identifier).await? else {
            // Burn one argon2 run so unknown accounts are not faster to reject
            verify_password(password, DUMMY_PASSWORD_HASH).ok();
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &credentials.password_hash)?;

        Ok(credentials.user)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername`, `AuthError::InvalidEmail` or
    /// `AuthError::WeakPassword` for malformed input, and
    /// `AuthError::DuplicateUsername` / `AuthError::DuplicateEmail` when the
    /// name or address is taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&NewUser {
                username,
                email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "account registered");
        Ok(user)
    }
}
