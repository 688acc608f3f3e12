use sqlx::{query, query_as, query_scalar};
use time::OffsetDateTime;

use crate::application::repos::{CreateReviewParams, RepoError, ReviewsRepo};
use crate::domain::entities::ReviewRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    user_id: i64,
    product_id: i64,
    rating: i16,
    comment: Option<String>,
    created_at: OffsetDateTime,
}

impl From<ReviewRow> for ReviewRecord {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

#[async_trait::async_trait]
impl ReviewsRepo for PostgresRepositories {
    async fn review_exists(&self, user_id: i64, product_id: i64) -> Result<bool, RepoError> {
        query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_review(&self, params: CreateReviewParams) -> Result<ReviewRecord, RepoError> {
        let row: ReviewRow = query_as(
            r#"
            INSERT INTO reviews (user_id, product_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, product_id, rating, comment, created_at
            "#,
        )
        .bind(params.user_id)
        .bind(params.product_id)
        .bind(params.rating)
        .bind(params.comment)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_review(&self, id: i64) -> Result<Option<ReviewRecord>, RepoError> {
        let row: Option<ReviewRow> = query_as(
            r#"
            SELECT id, user_id, product_id, rating, comment, created_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn delete_review(&self, id: i64) -> Result<(), RepoError> {
        let result = query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
