//! Application services: access policy, composed listing, and write paths.

pub mod access;
pub mod auth;
pub mod carts;
pub mod error;
pub mod listing;
pub mod monitor;
pub mod orders;
pub mod pagination;
pub mod policy;
pub mod query;
pub mod repos;
pub mod reviews;
