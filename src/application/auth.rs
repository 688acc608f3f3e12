//! Bearer-token authentication for storefront users.
//!
//! Tokens have the form `sf_<prefix>_<secret>`; only the SHA-256 of the
//! secret is persisted and comparison is constant-time.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{AccessTokensRepo, CreateAccessTokenParams, RepoError};
use crate::domain::entities::{AccessTokenRecord, UserRecord};
use crate::domain::types::UserRole;

const TOKEN_PREFIX: &str = "sf";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid access token")]
    Invalid,
    #[error("expired access token")]
    Expired,
    #[error("revoked access token")]
    Revoked,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Authenticated actor making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
}

impl Principal {
    pub fn new(user_id: i64, username: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }
}

impl From<&UserRecord> for Principal {
    fn from(user: &UserRecord) -> Self {
        Self::new(user.id, user.username.clone(), user.role)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub record: AccessTokenRecord,
    pub token: String,
}

#[derive(Clone)]
pub struct TokenService {
    repo: Arc<dyn AccessTokensRepo>,
}

impl TokenService {
    pub fn new(repo: Arc<dyn AccessTokensRepo>) -> Self {
        Self { repo }
    }

    pub async fn issue(
        &self,
        user_id: i64,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<IssuedToken, AuthError> {
        let prefix = Uuid::new_v4().simple().to_string()[..12].to_string();
        let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");

        let record = self
            .repo
            .create_token(CreateAccessTokenParams {
                user_id,
                prefix,
                hashed_secret: hash_secret(&secret),
                expires_at,
            })
            .await?;

        Ok(IssuedToken { record, token })
    }

    pub async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let (prefix, secret) = parse_token(token).ok_or(AuthError::Invalid)?;
        let record = self
            .repo
            .find_token_by_prefix(prefix)
            .await?
            .ok_or(AuthError::Invalid)?;

        let now = OffsetDateTime::now_utc();
        if record.revoked_at.is_some_and(|at| at <= now) {
            return Err(AuthError::Revoked);
        }
        if record.expires_at.is_some_and(|at| at <= now) {
            return Err(AuthError::Expired);
        }
        if record.hashed_secret.ct_eq(&hash_secret(secret)).unwrap_u8() == 0 {
            return Err(AuthError::Invalid);
        }

        let user = self
            .repo
            .find_user(record.user_id)
            .await?
            .ok_or(AuthError::Invalid)?;
        Ok(Principal::from(&user))
    }

    pub async fn profile(&self, principal: &Principal) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.repo.find_user(principal.user_id).await?)
    }
}

fn hash_secret(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}

fn parse_token(token: &str) -> Option<(&str, &str)> {
    let mut parts = token.splitn(3, '_');
    if parts.next()? != TOKEN_PREFIX {
        return None;
    }
    let prefix = parts.next()?;
    let secret = parts.next()?;
    if prefix.is_empty() || secret.len() < MIN_SECRET_LEN {
        return None;
    }
    Some((prefix, secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_token_requires_tag_prefix_and_long_secret() {
        let secret = "a".repeat(MIN_SECRET_LEN);
        assert_eq!(
            parse_token(&format!("sf_abc_{secret}")),
            Some(("abc", secret.as_str()))
        );
        assert!(parse_token(&format!("sk_abc_{secret}")).is_none());
        assert!(parse_token(&format!("sf__{secret}")).is_none());
        assert!(parse_token("sf_abc_short").is_none());
        assert!(parse_token("garbage").is_none());
    }

    #[test]
    fn hashed_secret_is_stable() {
        assert_eq!(hash_secret("s3cret"), hash_secret("s3cret"));
        assert_ne!(hash_secret("s3cret"), hash_secret("s3cret!"));
        assert_eq!(hash_secret("s3cret").len(), 32);
    }
}
