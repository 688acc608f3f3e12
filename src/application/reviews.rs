//! Review write path.
//!
//! Writes never touch the response cache; review listings may lag by up to
//! one TTL after a create or delete.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::access::Caller;
use crate::application::auth::Principal;
use crate::application::policy::{self, AccessError, Action, Capability};
use crate::application::repos::{CreateReviewParams, RepoError, ReviewsRepo};
use crate::domain::entities::ReviewRecord;
use crate::domain::error::DomainError;
use crate::domain::resources::ResourceKind;

pub const DUPLICATE_REVIEW_MESSAGE: &str = "You have already reviewed this product.";
const MAX_COMMENT_LEN: usize = 4000;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateReviewCommand {
    pub product_id: i64,
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(Clone)]
pub struct ReviewService {
    repo: Arc<dyn ReviewsRepo>,
}

impl ReviewService {
    pub fn new(repo: Arc<dyn ReviewsRepo>) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        caller: &Caller,
        command: CreateReviewCommand,
    ) -> Result<ReviewRecord, ReviewError> {
        policy::authorize(caller, ResourceKind::Reviews, Action::Create)?;
        let principal = caller.principal().ok_or(AccessError::Unauthenticated)?;

        if !(1..=5).contains(&command.rating) {
            return Err(DomainError::validation("rating must be between 1 and 5").into());
        }
        let comment = command
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if comment.as_ref().is_some_and(|c| c.len() > MAX_COMMENT_LEN) {
            return Err(DomainError::validation("comment is too long").into());
        }

        if self
            .repo
            .review_exists(principal.user_id, command.product_id)
            .await?
        {
            return Err(duplicate());
        }

        let review = self
            .repo
            .create_review(CreateReviewParams {
                user_id: principal.user_id,
                product_id: command.product_id,
                rating: command.rating,
                comment,
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => duplicate(),
                other => ReviewError::Repo(other),
            })?;

        info!(
            target: "storefront::reviews",
            review_id = review.id,
            user_id = principal.user_id,
            product_id = review.product_id,
            "review created"
        );
        Ok(review)
    }

    /// Delete a review written by the caller. Moderators may delete any review;
    /// for everyone else a foreign review is reported as missing.
    pub async fn delete(&self, caller: &Caller, id: i64) -> Result<(), ReviewError> {
        policy::authorize(caller, ResourceKind::Reviews, Action::Delete)?;
        let principal = caller.principal().ok_or(AccessError::Unauthenticated)?;

        let review = self
            .repo
            .find_review(id)
            .await?
            .ok_or(DomainError::not_found("review"))?;
        if !can_manage(caller, principal, &review) {
            return Err(DomainError::not_found("review").into());
        }

        self.repo.delete_review(id).await?;
        info!(
            target: "storefront::reviews",
            review_id = id,
            user_id = principal.user_id,
            "review deleted"
        );
        Ok(())
    }
}

fn can_manage(caller: &Caller, principal: &Principal, review: &ReviewRecord) -> bool {
    review.user_id == principal.user_id || policy::holds(caller, Capability::ModerateReviews)
}

fn duplicate() -> ReviewError {
    DomainError::conflict("review", DUPLICATE_REVIEW_MESSAGE).into()
}
