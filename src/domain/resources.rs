//! Static registry of the collections exposed through the list endpoint.
//!
//! Each resource declares its table, cache prefix, the fields callers may
//! filter and sort on, a default order, and how rows relate to their owner.

use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Value type of a filterable column, used to parse raw query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Integer,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FilterField {
    FilterField { name, kind }
}

/// One foreign-key hop: `column` on the current table references `table.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub column: &'static str,
    pub table: &'static str,
}

/// Relationship chain from a row to the column holding its owner's user id.
///
/// Direct ownership has no hops (`user_id = principal`); indirect ownership
/// walks one or more parents first (`cart_id -> carts.user_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipPath {
    pub hops: &'static [Hop],
    pub owner_column: &'static str,
}

impl OwnershipPath {
    pub const fn direct(owner_column: &'static str) -> Self {
        Self {
            hops: &[],
            owner_column,
        }
    }

    pub const fn through(hops: &'static [Hop], owner_column: &'static str) -> Self {
        Self { hops, owner_column }
    }
}

impl Display for OwnershipPath {
    /// Renders the dotted form, e.g. `order.user`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for hop in self.hops {
            write!(f, "{}.", hop.column.trim_end_matches("_id"))?;
        }
        f.write_str(self.owner_column.trim_end_matches("_id"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Public,
    Owned(OwnershipPath),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Categories,
    Products,
    Variants,
    Inventory,
    Discounts,
    ProductDiscounts,
    Carts,
    CartItems,
    Wishlists,
    WishlistItems,
    Orders,
    OrderItems,
    Shipments,
    Payments,
    Reviews,
    Addresses,
    Users,
    ServiceChecks,
}

impl ResourceKind {
    pub fn all() -> &'static [ResourceKind] {
        &[
            Self::Categories,
            Self::Products,
            Self::Variants,
            Self::Inventory,
            Self::Discounts,
            Self::ProductDiscounts,
            Self::Carts,
            Self::CartItems,
            Self::Wishlists,
            Self::WishlistItems,
            Self::Orders,
            Self::OrderItems,
            Self::Shipments,
            Self::Payments,
            Self::Reviews,
            Self::Addresses,
            Self::Users,
            Self::ServiceChecks,
        ]
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.descriptor().slug == slug)
    }

    pub fn slug(self) -> &'static str {
        self.descriptor().slug
    }

    pub fn descriptor(self) -> &'static ResourceDescriptor {
        match self {
            Self::Categories => &CATEGORIES,
            Self::Products => &PRODUCTS,
            Self::Variants => &VARIANTS,
            Self::Inventory => &INVENTORY,
            Self::Discounts => &DISCOUNTS,
            Self::ProductDiscounts => &PRODUCT_DISCOUNTS,
            Self::Carts => &CARTS,
            Self::CartItems => &CART_ITEMS,
            Self::Wishlists => &WISHLISTS,
            Self::WishlistItems => &WISHLIST_ITEMS,
            Self::Orders => &ORDERS,
            Self::OrderItems => &ORDER_ITEMS,
            Self::Shipments => &SHIPMENTS,
            Self::Payments => &PAYMENTS,
            Self::Reviews => &REVIEWS,
            Self::Addresses => &ADDRESSES,
            Self::Users => &USERS,
            Self::ServiceChecks => &SERVICE_CHECKS,
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    /// URL segment under `/api/v1/`.
    pub slug: &'static str,
    pub table: &'static str,
    pub cache_prefix: &'static str,
    pub filterable: &'static [FilterField],
    pub sortable: &'static [&'static str],
    /// Ordering terms in `-field` form, applied when the caller supplies none.
    pub default_order: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub scope: Scope,
}

impl ResourceDescriptor {
    pub fn filter_field(&self, name: &str) -> Option<&FilterField> {
        self.filterable.iter().find(|f| f.name == name)
    }

    pub fn is_sortable(&self, name: &str) -> bool {
        self.sortable.contains(&name)
    }

    pub fn ownership(&self) -> Option<&OwnershipPath> {
        match &self.scope {
            Scope::Public => None,
            Scope::Owned(path) => Some(path),
        }
    }

    pub fn is_principal_scoped(&self) -> bool {
        matches!(self.scope, Scope::Owned(_))
    }
}

use FieldKind::{Bool, Integer, Text};

const VIA_CART: &[Hop] = &[Hop {
    column: "cart_id",
    table: "carts",
}];
const VIA_WISHLIST: &[Hop] = &[Hop {
    column: "wishlist_id",
    table: "wishlists",
}];
const VIA_ORDER: &[Hop] = &[Hop {
    column: "order_id",
    table: "orders",
}];

static CATEGORIES: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Categories,
    slug: "categories",
    table: "categories",
    cache_prefix: "categories",
    filterable: &[field("parent_id", Integer), field("name", Text)],
    sortable: &["name", "created_at"],
    default_order: &["name"],
    search_fields: &["name", "description"],
    scope: Scope::Public,
};

static PRODUCTS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Products,
    slug: "products",
    table: "products",
    cache_prefix: "products",
    filterable: &[
        field("category_id", Integer),
        field("is_active", Bool),
        field("brand", Text),
        field("sku", Text),
    ],
    sortable: &["price_cents", "name", "date_added", "stock_quantity"],
    default_order: &["-date_added"],
    search_fields: &["name", "description", "brand"],
    scope: Scope::Public,
};

static VARIANTS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Variants,
    slug: "variants",
    table: "variants",
    cache_prefix: "variants",
    filterable: &[field("product_id", Integer), field("sku", Text)],
    sortable: &["price_cents", "variant_name", "created_at"],
    default_order: &["variant_name"],
    search_fields: &["variant_name", "sku"],
    scope: Scope::Public,
};

static INVENTORY: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Inventory,
    slug: "inventory",
    table: "inventory",
    cache_prefix: "inventory",
    filterable: &[field("variant_id", Integer)],
    sortable: &["quantity", "updated_at"],
    default_order: &["-updated_at"],
    search_fields: &[],
    scope: Scope::Public,
};

static DISCOUNTS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Discounts,
    slug: "discounts",
    table: "discounts",
    cache_prefix: "discounts",
    filterable: &[
        field("code", Text),
        field("is_active", Bool),
        field("discount_type", Text),
    ],
    sortable: &["start_date", "end_date", "code"],
    default_order: &["-start_date"],
    search_fields: &["code", "description"],
    scope: Scope::Public,
};

static PRODUCT_DISCOUNTS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::ProductDiscounts,
    slug: "product-discounts",
    table: "product_discounts",
    cache_prefix: "product_discounts",
    filterable: &[field("discount_id", Integer), field("product_id", Integer)],
    sortable: &["id"],
    default_order: &["id"],
    search_fields: &[],
    scope: Scope::Public,
};

static CARTS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Carts,
    slug: "carts",
    table: "carts",
    cache_prefix: "carts",
    filterable: &[],
    sortable: &["created_at", "updated_at"],
    default_order: &["-created_at"],
    search_fields: &[],
    scope: Scope::Owned(OwnershipPath::direct("user_id")),
};

static CART_ITEMS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::CartItems,
    slug: "cart-items",
    table: "cart_items",
    cache_prefix: "cart_items",
    filterable: &[field("cart_id", Integer), field("variant_id", Integer)],
    sortable: &["quantity", "created_at"],
    default_order: &["-created_at"],
    search_fields: &[],
    scope: Scope::Owned(OwnershipPath::through(VIA_CART, "user_id")),
};

static WISHLISTS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Wishlists,
    slug: "wishlists",
    table: "wishlists",
    cache_prefix: "wishlists",
    filterable: &[],
    sortable: &["created_at"],
    default_order: &["-created_at"],
    search_fields: &[],
    scope: Scope::Owned(OwnershipPath::direct("user_id")),
};

static WISHLIST_ITEMS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::WishlistItems,
    slug: "wishlist-items",
    table: "wishlist_items",
    cache_prefix: "wishlist_items",
    filterable: &[field("wishlist_id", Integer), field("product_id", Integer)],
    sortable: &["added_at"],
    default_order: &["-added_at"],
    search_fields: &[],
    scope: Scope::Owned(OwnershipPath::through(VIA_WISHLIST, "user_id")),
};

static ORDERS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Orders,
    slug: "orders",
    table: "orders",
    cache_prefix: "orders",
    filterable: &[
        field("payment_status", Text),
        field("payment_method", Text),
    ],
    sortable: &["order_date", "total_amount_cents"],
    default_order: &["-order_date"],
    search_fields: &["order_number"],
    scope: Scope::Owned(OwnershipPath::direct("user_id")),
};

static ORDER_ITEMS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::OrderItems,
    slug: "order-items",
    table: "order_items",
    cache_prefix: "order_items",
    filterable: &[field("order_id", Integer), field("variant_id", Integer)],
    sortable: &["quantity", "subtotal_cents"],
    default_order: &["id"],
    search_fields: &[],
    scope: Scope::Owned(OwnershipPath::through(VIA_ORDER, "user_id")),
};

static SHIPMENTS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Shipments,
    slug: "shipments",
    table: "shipments",
    cache_prefix: "shipments",
    filterable: &[
        field("order_id", Integer),
        field("status", Text),
        field("carrier", Text),
    ],
    sortable: &["shipped_at", "delivered_at"],
    default_order: &["-shipped_at"],
    search_fields: &["tracking_number", "carrier"],
    scope: Scope::Owned(OwnershipPath::through(VIA_ORDER, "user_id")),
};

static PAYMENTS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Payments,
    slug: "payments",
    table: "payments",
    cache_prefix: "payments",
    filterable: &[
        field("order_id", Integer),
        field("payment_status", Text),
        field("payment_method", Text),
    ],
    sortable: &["payment_date", "amount_cents"],
    default_order: &["-payment_date"],
    search_fields: &["transaction_id"],
    scope: Scope::Owned(OwnershipPath::through(VIA_ORDER, "user_id")),
};

static REVIEWS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Reviews,
    slug: "reviews",
    table: "reviews",
    cache_prefix: "reviews",
    filterable: &[field("product_id", Integer), field("rating", Integer)],
    sortable: &["rating", "created_at"],
    default_order: &["-created_at"],
    search_fields: &["comment"],
    scope: Scope::Owned(OwnershipPath::direct("user_id")),
};

static ADDRESSES: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Addresses,
    slug: "addresses",
    table: "addresses",
    cache_prefix: "addresses",
    filterable: &[
        field("address_type", Text),
        field("country", Text),
        field("city", Text),
    ],
    sortable: &["city", "country"],
    default_order: &["id"],
    search_fields: &["street", "city"],
    scope: Scope::Owned(OwnershipPath::direct("user_id")),
};

static USERS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Users,
    slug: "users",
    table: "users",
    cache_prefix: "users",
    filterable: &[field("role", Text)],
    sortable: &["username", "id"],
    default_order: &["username"],
    search_fields: &["username", "email"],
    scope: Scope::Owned(OwnershipPath::direct("id")),
};

static SERVICE_CHECKS: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::ServiceChecks,
    slug: "service-checks",
    table: "service_checks",
    cache_prefix: "service_checks",
    filterable: &[field("service_name", Text), field("success", Bool)],
    sortable: &["checked_at", "response_time_ms"],
    default_order: &["-checked_at"],
    search_fields: &["service_name"],
    scope: Scope::Public,
};
