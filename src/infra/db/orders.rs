use sqlx::{query_as, query_scalar};
use time::OffsetDateTime;

use crate::application::repos::{CreateOrderParams, OrdersRepo, RepoError};
use crate::domain::entities::OrderRecord;
use crate::domain::types::{PaymentMethod, PaymentStatus};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    address_id: Option<i64>,
    order_number: String,
    total_amount_cents: i64,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    order_date: OffsetDateTime,
    shipped_date: Option<OffsetDateTime>,
}

impl From<OrderRow> for OrderRecord {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            address_id: row.address_id,
            order_number: row.order_number,
            total_amount_cents: row.total_amount_cents,
            payment_status: row.payment_status,
            payment_method: row.payment_method,
            order_date: row.order_date,
            shipped_date: row.shipped_date,
        }
    }
}

#[async_trait::async_trait]
impl OrdersRepo for PostgresRepositories {
    async fn address_owner(&self, address_id: i64) -> Result<Option<i64>, RepoError> {
        query_scalar::<_, i64>("SELECT user_id FROM addresses WHERE id = $1")
            .bind(address_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn count_orders(&self) -> Result<u64, RepoError> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn create_order(&self, params: CreateOrderParams) -> Result<OrderRecord, RepoError> {
        let row: OrderRow = query_as(
            r#"
            INSERT INTO orders (
                user_id, address_id, order_number, total_amount_cents,
                payment_status, payment_method, order_date
            )
            VALUES ($1, $2, $3, 0, $4, $5, $6)
            RETURNING id, user_id, address_id, order_number, total_amount_cents,
                      payment_status, payment_method, order_date, shipped_date
            "#,
        )
        .bind(params.user_id)
        .bind(params.address_id)
        .bind(params.order_number)
        .bind(PaymentStatus::Pending)
        .bind(params.payment_method)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
