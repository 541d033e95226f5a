//! User repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use dessert_shop_core::{Email, LoginIdentifier, UserId, Username};

use super::{RepositoryError, UserStore};
use crate::models::user::{NewUser, User, UserCredentials};

/// Repository for user database operations.
pub struct UserRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: Username,
    email: Email,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_credentials(self) -> UserCredentials {
        UserCredentials {
            user: User {
                id: self.id,
                username: self.username,
                email: self.email,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            password_hash: self.password_hash,
        }
    }
}

const SELECT_USER: &str = "
    SELECT id, username, email, password_hash, created_at, updated_at
    FROM users
";

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(
            r"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at, updated_at
            ",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::classify)?;

        Ok(row.into_credentials().user)
    }

    async fn find_credentials(
        &self,
        identifier: &LoginIdentifier,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let query = match identifier {
            LoginIdentifier::Email(_) => format!("{SELECT_USER} WHERE email = $1"),
            LoginIdentifier::Username(_) => format!("{SELECT_USER} WHERE username = $1"),
        };

        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(identifier.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserRow::into_credentials))
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let query = format!("{SELECT_USER} WHERE id = $1");
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_credentials().user))
    }
}
