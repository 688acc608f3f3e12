use sqlx::{query, query_as, query_scalar};
use time::OffsetDateTime;

use crate::application::repos::{AddCartItemParams, CartsRepo, RepoError, WishlistsRepo};
use crate::domain::entities::{CartItemRecord, WishlistItemRecord};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    cart_id: i64,
    variant_id: i64,
    quantity: i32,
    price_cents: i64,
    created_at: OffsetDateTime,
}

impl From<CartItemRow> for CartItemRecord {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            cart_id: row.cart_id,
            variant_id: row.variant_id,
            quantity: row.quantity,
            price_cents: row.price_cents,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WishlistItemRow {
    id: i64,
    wishlist_id: i64,
    product_id: i64,
    added_at: OffsetDateTime,
}

impl From<WishlistItemRow> for WishlistItemRecord {
    fn from(row: WishlistItemRow) -> Self {
        Self {
            id: row.id,
            wishlist_id: row.wishlist_id,
            product_id: row.product_id,
            added_at: row.added_at,
        }
    }
}

#[async_trait::async_trait]
impl CartsRepo for PostgresRepositories {
    async fn variant_price(&self, variant_id: i64) -> Result<Option<i64>, RepoError> {
        query_scalar::<_, i64>("SELECT price_cents FROM variants WHERE id = $1")
            .bind(variant_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn ensure_cart(&self, user_id: i64) -> Result<i64, RepoError> {
        query_scalar::<_, i64>(
            r#"
            INSERT INTO carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = now()
            RETURNING id
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn add_cart_item(&self, params: AddCartItemParams) -> Result<CartItemRecord, RepoError> {
        let row: CartItemRow = query_as(
            r#"
            INSERT INTO cart_items (cart_id, variant_id, quantity, price_cents, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (cart_id, variant_id)
                DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            RETURNING id, cart_id, variant_id, quantity, price_cents, created_at
            "#,
        )
        .bind(params.cart_id)
        .bind(params.variant_id)
        .bind(params.quantity)
        .bind(params.price_cents)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_cart_item(&self, user_id: i64, item_id: i64) -> Result<bool, RepoError> {
        let result = query(
            r#"
            DELETE FROM cart_items
            WHERE id = $1
              AND cart_id IN (SELECT id FROM carts WHERE user_id = $2)
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl WishlistsRepo for PostgresRepositories {
    async fn product_exists(&self, product_id: i64) -> Result<bool, RepoError> {
        query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(product_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn ensure_wishlist(&self, user_id: i64) -> Result<i64, RepoError> {
        query_scalar::<_, i64>(
            r#"
            INSERT INTO wishlists (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn add_wishlist_item(
        &self,
        wishlist_id: i64,
        product_id: i64,
    ) -> Result<WishlistItemRecord, RepoError> {
        // The no-op update makes RETURNING yield the existing row.
        let row: WishlistItemRow = query_as(
            r#"
            INSERT INTO wishlist_items (wishlist_id, product_id, added_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (wishlist_id, product_id)
                DO UPDATE SET wishlist_id = EXCLUDED.wishlist_id
            RETURNING id, wishlist_id, product_id, added_at
            "#,
        )
        .bind(wishlist_id)
        .bind(product_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_wishlist_item(&self, user_id: i64, item_id: i64) -> Result<bool, RepoError> {
        let result = query(
            r#"
            DELETE FROM wishlist_items
            WHERE id = $1
              AND wishlist_id IN (SELECT id FROM wishlists WHERE user_id = $2)
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
