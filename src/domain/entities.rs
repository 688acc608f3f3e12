//! Domain entities mirrored from persistent storage.
//!
//! Collection rows are handled as opaque JSON; only the records the
//! application reads or writes field-by-field are modelled here.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::types::{PaymentMethod, PaymentStatus, UserRole};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessTokenRecord {
    pub id: i64,
    pub user_id: i64,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub expires_at: Option<OffsetDateTime>,
    pub revoked_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRecord {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub rating: i16,
    pub comment: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCheckRecord {
    pub id: i64,
    pub service_name: String,
    pub success: bool,
    pub http_status_code: Option<i32>,
    pub response_time_ms: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub checked_at: OffsetDateTime,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItemRecord {
    pub id: i64,
    pub cart_id: i64,
    pub variant_id: i64,
    pub quantity: i32,
    pub price_cents: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WishlistItemRecord {
    pub id: i64,
    pub wishlist_id: i64,
    pub product_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub id: i64,
    pub user_id: i64,
    pub address_id: Option<i64>,
    pub order_number: String,
    pub total_amount_cents: i64,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    #[serde(with = "time::serde::rfc3339")]
    pub order_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub shipped_date: Option<OffsetDateTime>,
}
