use sqlx::query_as;
use time::OffsetDateTime;

use crate::application::repos::{AccessTokensRepo, CreateAccessTokenParams, RepoError};
use crate::domain::entities::{AccessTokenRecord, UserRecord};
use crate::domain::types::UserRole;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct AccessTokenRow {
    id: i64,
    user_id: i64,
    prefix: String,
    hashed_secret: Vec<u8>,
    expires_at: Option<OffsetDateTime>,
    revoked_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
}

impl From<AccessTokenRow> for AccessTokenRecord {
    fn from(row: AccessTokenRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            prefix: row.prefix,
            hashed_secret: row.hashed_secret,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    role: UserRole,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            role: row.role,
        }
    }
}

#[async_trait::async_trait]
impl AccessTokensRepo for PostgresRepositories {
    async fn create_token(
        &self,
        params: CreateAccessTokenParams,
    ) -> Result<AccessTokenRecord, RepoError> {
        let row: AccessTokenRow = query_as(
            r#"
            INSERT INTO access_tokens (user_id, prefix, hashed_secret, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, prefix, hashed_secret, expires_at, revoked_at, created_at
            "#,
        )
        .bind(params.user_id)
        .bind(params.prefix)
        .bind(params.hashed_secret)
        .bind(params.expires_at)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_token_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<AccessTokenRecord>, RepoError> {
        let row: Option<AccessTokenRow> = query_as(
            r#"
            SELECT id, user_id, prefix, hashed_secret, expires_at, revoked_at, created_at
            FROM access_tokens
            WHERE prefix = $1
            "#,
        )
        .bind(prefix)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        let row: Option<UserRow> = query_as(
            r#"
            SELECT id, username, email, first_name, last_name, phone, role
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }
}
