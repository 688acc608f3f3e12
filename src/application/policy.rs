//! Access policy: which capabilities each (resource, action) pair requires.
//!
//! Capabilities derive from the caller's role. Requirements are conjunctive
//! and looked up once per request from a fixed table.

use thiserror::Error;

use crate::application::access::Caller;
use crate::domain::resources::ResourceKind;
use crate::domain::types::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Action {
    fn is_read(self) -> bool {
        matches!(self, Self::List | Self::Retrieve)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Authenticated,
    ManageCatalog,
    ManageDiscounts,
    ManageInventory,
    ViewUsers,
    ModerateReviews,
    OperateMonitor,
}

impl Capability {
    pub fn granted_to(role: UserRole) -> &'static [Capability] {
        use Capability::*;
        match role {
            UserRole::Admin => &[
                Authenticated,
                ManageCatalog,
                ManageDiscounts,
                ManageInventory,
                ViewUsers,
                ModerateReviews,
                OperateMonitor,
            ],
            UserRole::Vendor => &[Authenticated, ManageInventory, ViewUsers],
            UserRole::Customer => &[Authenticated],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("missing capability {0:?}")]
    Forbidden(Capability),
}

const NONE: &[Capability] = &[];
const AUTHENTICATED: &[Capability] = &[Capability::Authenticated];
const CATALOG: &[Capability] = &[Capability::ManageCatalog];
const DISCOUNTS: &[Capability] = &[Capability::ManageDiscounts];
const INVENTORY: &[Capability] = &[Capability::ManageInventory];
const USERS: &[Capability] = &[Capability::ViewUsers];
const MONITOR: &[Capability] = &[Capability::OperateMonitor];

/// Capabilities required to perform `action` on `resource`.
pub fn required(resource: ResourceKind, action: Action) -> &'static [Capability] {
    use ResourceKind::*;
    match (resource, action.is_read()) {
        (Categories | Products | Variants, true) => NONE,
        (Categories | Products | Variants, false) => CATALOG,
        (Discounts | ProductDiscounts, _) => DISCOUNTS,
        (Inventory, _) => INVENTORY,
        (ServiceChecks, true) => NONE,
        (ServiceChecks, false) => MONITOR,
        (Users, _) if action == Action::List => USERS,
        (Users, _) => AUTHENTICATED,
        (
            Carts | CartItems | Wishlists | WishlistItems | Orders | OrderItems | Shipments
            | Payments | Reviews | Addresses,
            true,
        ) => NONE,
        (
            Carts | CartItems | Wishlists | WishlistItems | Orders | OrderItems | Shipments
            | Payments | Reviews | Addresses,
            false,
        ) => AUTHENTICATED,
    }
}

pub fn holds(caller: &Caller, capability: Capability) -> bool {
    match caller {
        Caller::User(principal) => Capability::granted_to(principal.role).contains(&capability),
        Caller::Anonymous | Caller::SchemaProbe => false,
    }
}

/// Check that `caller` holds every capability the table requires.
pub fn authorize(caller: &Caller, resource: ResourceKind, action: Action) -> Result<(), AccessError> {
    for capability in required(resource, action) {
        if holds(caller, *capability) {
            continue;
        }
        return Err(match caller {
            Caller::User(_) => AccessError::Forbidden(*capability),
            Caller::Anonymous | Caller::SchemaProbe => AccessError::Unauthenticated,
        });
    }
    Ok(())
}
