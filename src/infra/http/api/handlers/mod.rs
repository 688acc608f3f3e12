//! API handlers organized by concern.
//!
//! Collection reads share one generic pair of handlers. Reviews, carts,
//! wishlists, orders, the caller profile and the health monitor add their own
//! write or action endpoints.

mod auth;
mod carts;
mod collections;
mod monitor;
mod orders;
mod reviews;

pub use auth::*;
pub use carts::*;
pub use collections::*;
pub use monitor::*;
pub use orders::*;
pub use reviews::*;
