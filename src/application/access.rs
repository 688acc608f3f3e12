//! Ownership filtering of principal-scoped collections.
//!
//! A caller is resolved to a [`ListScope`] describing which rows of a
//! collection it may see. Role elevation is looked up first and replaces the
//! ownership filter only for roles the elevation table names.

use crate::application::auth::Principal;
use crate::application::policy::{self, Capability};
use crate::domain::resources::{OwnershipPath, ResourceDescriptor, ResourceKind};
use crate::domain::types::UserRole;

/// Who is asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    /// Synthetic request from API documentation tooling; never reaches storage.
    SchemaProbe,
    User(Principal),
}

impl Caller {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::User(principal) => Some(principal),
            Self::Anonymous | Self::SchemaProbe => None,
        }
    }
}

/// Row visibility for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// Unrestricted collection.
    Everything,
    /// Empty collection; storage is not consulted.
    Nothing,
    /// Rows whose ownership path resolves to `owner_id`.
    Owned {
        path: OwnershipPath,
        owner_id: i64,
    },
    /// Rows whose `column` equals a fixed value.
    Matching {
        column: &'static str,
        value: &'static str,
    },
}

impl ListScope {
    /// Stable label folded into cache keys for principal-scoped resources.
    pub fn cache_label(&self) -> String {
        match self {
            Self::Everything => "all".to_string(),
            Self::Nothing => "none".to_string(),
            Self::Owned { path, owner_id } => format!("{path}={owner_id}"),
            Self::Matching { column, value } => format!("{column}:{value}"),
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing)
    }
}

/// Role-specific visibility that replaces the ownership filter.
fn elevation(resource: ResourceKind, principal: &Principal) -> Option<ListScope> {
    let caller = Caller::User(principal.clone());
    match (resource, principal.role) {
        (ResourceKind::Reviews, _) if policy::holds(&caller, Capability::ModerateReviews) => {
            Some(ListScope::Everything)
        }
        (ResourceKind::Reviews, UserRole::Vendor) => Some(ListScope::Nothing),
        (ResourceKind::Users, UserRole::Admin) => Some(ListScope::Everything),
        (ResourceKind::Users, UserRole::Vendor) => Some(ListScope::Matching {
            column: "role",
            value: UserRole::Customer.as_str(),
        }),
        _ => None,
    }
}

/// Resolve which rows of `descriptor`'s collection `caller` may see.
///
/// Public collections are unrestricted for every caller. Principal-scoped
/// collections are empty for anonymous callers and schema probes.
pub fn resolve_scope(descriptor: &ResourceDescriptor, caller: &Caller) -> ListScope {
    let Some(path) = descriptor.ownership() else {
        return ListScope::Everything;
    };

    let Some(principal) = caller.principal() else {
        return ListScope::Nothing;
    };

    if let Some(scope) = elevation(descriptor.kind, principal) {
        return scope;
    }

    ListScope::Owned {
        path: *path,
        owner_id: principal.user_id,
    }
}
