//! Cart and wishlist write paths.
//!
//! Each user owns at most one cart and one wishlist, created on first use.
//! Like reviews, these writes leave the response cache untouched.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::access::Caller;
use crate::application::auth::Principal;
use crate::application::policy::{self, AccessError, Action};
use crate::application::repos::{AddCartItemParams, CartsRepo, RepoError, WishlistsRepo};
use crate::domain::entities::{CartItemRecord, WishlistItemRecord};
use crate::domain::error::DomainError;
use crate::domain::resources::ResourceKind;

const MAX_LINE_QUANTITY: i32 = 999;

#[derive(Debug, Error)]
pub enum CartError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy)]
pub struct AddToCartCommand {
    pub variant_id: i64,
    pub quantity: i32,
}

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartsRepo>,
    wishlists: Arc<dyn WishlistsRepo>,
}

fn principal_for<'a>(
    caller: &'a Caller,
    resource: ResourceKind,
    action: Action,
) -> Result<&'a Principal, CartError> {
    policy::authorize(caller, resource, action)?;
    Ok(caller.principal().ok_or(AccessError::Unauthenticated)?)
}

impl CartService {
    pub fn new(carts: Arc<dyn CartsRepo>, wishlists: Arc<dyn WishlistsRepo>) -> Self {
        Self { carts, wishlists }
    }

    /// Add a variant to the caller's cart. Adding a variant already in the
    /// cart increases that line's quantity; the line keeps its original price.
    pub async fn add_to_cart(
        &self,
        caller: &Caller,
        command: AddToCartCommand,
    ) -> Result<CartItemRecord, CartError> {
        let principal = principal_for(caller, ResourceKind::CartItems, Action::Create)?;

        if !(1..=MAX_LINE_QUANTITY).contains(&command.quantity) {
            return Err(DomainError::validation(format!(
                "quantity must be between 1 and {MAX_LINE_QUANTITY}"
            ))
            .into());
        }

        let price_cents = self
            .carts
            .variant_price(command.variant_id)
            .await?
            .ok_or(DomainError::not_found("variant"))?;
        let cart_id = self.carts.ensure_cart(principal.user_id).await?;

        let item = self
            .carts
            .add_cart_item(AddCartItemParams {
                cart_id,
                variant_id: command.variant_id,
                quantity: command.quantity,
                price_cents,
            })
            .await?;

        info!(
            target: "storefront::carts",
            user_id = principal.user_id,
            cart_item_id = item.id,
            variant_id = item.variant_id,
            quantity = item.quantity,
            "cart item added"
        );
        Ok(item)
    }

    /// Remove a line from the caller's cart. Lines in other carts read as missing.
    pub async fn remove_cart_item(&self, caller: &Caller, item_id: i64) -> Result<(), CartError> {
        let principal = principal_for(caller, ResourceKind::CartItems, Action::Delete)?;

        if !self
            .carts
            .delete_cart_item(principal.user_id, item_id)
            .await?
        {
            return Err(DomainError::not_found("cart item").into());
        }

        info!(
            target: "storefront::carts",
            user_id = principal.user_id,
            cart_item_id = item_id,
            "cart item removed"
        );
        Ok(())
    }

    pub async fn add_to_wishlist(
        &self,
        caller: &Caller,
        product_id: i64,
    ) -> Result<WishlistItemRecord, CartError> {
        let principal = principal_for(caller, ResourceKind::WishlistItems, Action::Create)?;

        if !self.wishlists.product_exists(product_id).await? {
            return Err(DomainError::not_found("product").into());
        }
        let wishlist_id = self.wishlists.ensure_wishlist(principal.user_id).await?;
        let item = self
            .wishlists
            .add_wishlist_item(wishlist_id, product_id)
            .await?;

        info!(
            target: "storefront::carts",
            user_id = principal.user_id,
            wishlist_item_id = item.id,
            product_id,
            "wishlist item added"
        );
        Ok(item)
    }

    pub async fn remove_from_wishlist(
        &self,
        caller: &Caller,
        item_id: i64,
    ) -> Result<(), CartError> {
        let principal = principal_for(caller, ResourceKind::WishlistItems, Action::Delete)?;

        if !self
            .wishlists
            .delete_wishlist_item(principal.user_id, item_id)
            .await?
        {
            return Err(DomainError::not_found("wishlist item").into());
        }

        info!(
            target: "storefront::carts",
            user_id = principal.user_id,
            wishlist_item_id = item_id,
            "wishlist item removed"
        );
        Ok(())
    }
}
