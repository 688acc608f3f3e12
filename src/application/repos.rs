//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::access::ListScope;
use crate::application::query::CollectionQuery;
use crate::domain::entities::{
    AccessTokenRecord, CartItemRecord, OrderRecord, ReviewRecord, ServiceCheckRecord, UserRecord,
    WishlistItemRecord,
};
use crate::domain::resources::ResourceDescriptor;
use crate::domain::types::PaymentMethod;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// One page of collection rows plus the exact number of matching rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRows {
    pub rows: Vec<Value>,
    pub total: u64,
}

/// Generic read access to every registered collection.
///
/// Rows are returned as JSON objects; implementations must honour the query's
/// filters, search, ordering, scope and page exactly.
#[async_trait]
pub trait CollectionRepo: Send + Sync {
    async fn fetch_page(
        &self,
        descriptor: &ResourceDescriptor,
        query: &CollectionQuery,
    ) -> Result<FetchedRows, RepoError>;

    async fn find_row(
        &self,
        descriptor: &ResourceDescriptor,
        scope: &ListScope,
        id: i64,
    ) -> Result<Option<Value>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateAccessTokenParams {
    pub user_id: i64,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub expires_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait AccessTokensRepo: Send + Sync {
    async fn create_token(
        &self,
        params: CreateAccessTokenParams,
    ) -> Result<AccessTokenRecord, RepoError>;

    async fn find_token_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<AccessTokenRecord>, RepoError>;

    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateReviewParams {
    pub user_id: i64,
    pub product_id: i64,
    pub rating: i16,
    pub comment: Option<String>,
}

#[async_trait]
pub trait ReviewsRepo: Send + Sync {
    async fn review_exists(&self, user_id: i64, product_id: i64) -> Result<bool, RepoError>;

    async fn create_review(&self, params: CreateReviewParams) -> Result<ReviewRecord, RepoError>;

    async fn find_review(&self, id: i64) -> Result<Option<ReviewRecord>, RepoError>;

    async fn delete_review(&self, id: i64) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct AddCartItemParams {
    pub cart_id: i64,
    pub variant_id: i64,
    pub quantity: i32,
    pub price_cents: i64,
}

/// Carts are created lazily, one per user.
#[async_trait]
pub trait CartsRepo: Send + Sync {
    /// Current unit price of a variant, if it exists.
    async fn variant_price(&self, variant_id: i64) -> Result<Option<i64>, RepoError>;

    /// Id of the user's cart, creating it on first use.
    async fn ensure_cart(&self, user_id: i64) -> Result<i64, RepoError>;

    /// Insert the line, or add `quantity` to an existing line for the same variant.
    async fn add_cart_item(&self, params: AddCartItemParams) -> Result<CartItemRecord, RepoError>;

    /// Delete a line from `user_id`'s cart. Returns false when no such line exists.
    async fn delete_cart_item(&self, user_id: i64, item_id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait WishlistsRepo: Send + Sync {
    async fn product_exists(&self, product_id: i64) -> Result<bool, RepoError>;

    async fn ensure_wishlist(&self, user_id: i64) -> Result<i64, RepoError>;

    /// Idempotent: returns the existing entry when the product is already listed.
    async fn add_wishlist_item(
        &self,
        wishlist_id: i64,
        product_id: i64,
    ) -> Result<WishlistItemRecord, RepoError>;

    async fn delete_wishlist_item(&self, user_id: i64, item_id: i64) -> Result<bool, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateOrderParams {
    pub user_id: i64,
    pub address_id: i64,
    pub order_number: String,
    pub payment_method: PaymentMethod,
}

#[async_trait]
pub trait OrdersRepo: Send + Sync {
    /// Owner of an address, if the address exists.
    async fn address_owner(&self, address_id: i64) -> Result<Option<i64>, RepoError>;

    async fn count_orders(&self) -> Result<u64, RepoError>;

    async fn create_order(&self, params: CreateOrderParams) -> Result<OrderRecord, RepoError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct NewServiceCheck {
    pub service_name: String,
    pub success: bool,
    pub http_status_code: Option<i32>,
    pub response_time_ms: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub checked_at: OffsetDateTime,
    pub error: Option<String>,
}

#[async_trait]
pub trait ServiceChecksRepo: Send + Sync {
    async fn record_check(&self, check: NewServiceCheck) -> Result<ServiceCheckRecord, RepoError>;
}

/// Backing-store liveness used by the `/health` endpoint.
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
