use serde::{Deserialize, Serialize};

use crate::application::repos::NewServiceCheck;
use crate::domain::types::PaymentMethod;

#[derive(Debug, Deserialize)]
pub struct ReviewCreateRequest {
    pub product_id: i64,
    pub rating: i16,
    #[serde(default)]
    pub comment: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub variant_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct WishlistAddRequest {
    pub product_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct OrderCreateRequest {
    pub address_id: i64,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct MonitorRunResponse {
    pub checks: Vec<NewServiceCheck>,
}
