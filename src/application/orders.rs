//! Order placement.
//!
//! An order starts empty: no items, a zero total and a pending payment.
//! Numbers follow `ORD-<user>-<sequence>` where the sequence is one past the
//! number of orders already stored; a collision surfaces as a conflict.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::access::Caller;
use crate::application::policy::{self, AccessError, Action};
use crate::application::repos::{CreateOrderParams, OrdersRepo, RepoError};
use crate::domain::entities::OrderRecord;
use crate::domain::error::DomainError;
use crate::domain::resources::ResourceKind;
use crate::domain::types::PaymentMethod;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy)]
pub struct CreateOrderCommand {
    pub address_id: i64,
    pub payment_method: PaymentMethod,
}

#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrdersRepo>,
}

pub fn order_number(user_id: i64, existing_orders: u64) -> String {
    format!("ORD-{user_id}-{}", existing_orders + 1)
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrdersRepo>) -> Self {
        Self { repo }
    }

    /// Place an order shipping to one of the caller's addresses. A foreign
    /// address is reported as missing.
    pub async fn create(
        &self,
        caller: &Caller,
        command: CreateOrderCommand,
    ) -> Result<OrderRecord, OrderError> {
        policy::authorize(caller, ResourceKind::Orders, Action::Create)?;
        let principal = caller.principal().ok_or(AccessError::Unauthenticated)?;

        let owner = self.repo.address_owner(command.address_id).await?;
        if owner != Some(principal.user_id) {
            return Err(DomainError::not_found("address").into());
        }

        let existing = self.repo.count_orders().await?;
        let order = self
            .repo
            .create_order(CreateOrderParams {
                user_id: principal.user_id,
                address_id: command.address_id,
                order_number: order_number(principal.user_id, existing),
                payment_method: command.payment_method,
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => OrderError::Domain(DomainError::conflict(
                    "order",
                    "Order number already taken, please retry.",
                )),
                other => OrderError::Repo(other),
            })?;

        info!(
            target: "storefront::orders",
            order_id = order.id,
            order_number = %order.order_number,
            user_id = principal.user_id,
            "order created"
        );
        Ok(order)
    }
}
