#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio::sync::Mutex;

use storefront::application::access::{Caller, ListScope};
use storefront::application::auth::{Principal, TokenService};
use storefront::application::carts::CartService;
use storefront::application::listing::ListService;
use storefront::application::monitor::HealthMonitor;
use storefront::application::orders::OrderService;
use storefront::application::pagination::PageLimits;
use storefront::application::query::{CollectionQuery, FilterValue};
use storefront::application::repos::{
    AccessTokensRepo, AddCartItemParams, CartsRepo, CollectionRepo, CreateAccessTokenParams,
    CreateOrderParams, CreateReviewParams, FetchedRows, NewServiceCheck, OrdersRepo,
    ReadinessCheck, RepoError, ReviewsRepo, ServiceChecksRepo, WishlistsRepo,
};
use storefront::application::reviews::ReviewService;
use storefront::cache::{CacheConfig, ManualClock, MemoryResponseStore, ResponseStore};
use storefront::domain::entities::{
    AccessTokenRecord, CartItemRecord, OrderRecord, ReviewRecord, ServiceCheckRecord, UserRecord,
    WishlistItemRecord,
};
use storefront::domain::resources::{OwnershipPath, ResourceDescriptor};
use storefront::domain::types::{PaymentStatus, UserRole};
use storefront::infra::http::{ApiState, RouterState};

pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;
pub const ADMIN: i64 = 3;
pub const VENDOR: i64 = 4;

/// Collection storage over JSON rows keyed by table name.
#[derive(Default)]
pub struct MemoryCollections {
    tables: std::sync::Mutex<HashMap<&'static str, Vec<Value>>>,
    fetches: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryCollections {
    pub fn insert(&self, table: &'static str, rows: Vec<Value>) {
        let mut tables = self.tables.lock().expect("tables lock");
        tables.entry(table).or_default().extend(rows);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(AtomicOrdering::SeqCst)
    }

    /// Make every subsequent fetch fail with a timeout until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    fn rows(&self, table: &str) -> Vec<Value> {
        let tables = self.tables.lock().expect("tables lock");
        tables.get(table).cloned().unwrap_or_default()
    }

    fn find(&self, table: &str, id: i64) -> Option<Value> {
        self.rows(table)
            .into_iter()
            .find(|row| row["id"].as_i64() == Some(id))
    }

    fn owner_of(&self, row: &Value, path: &OwnershipPath) -> Option<i64> {
        let mut current = row.clone();
        for hop in path.hops {
            let parent_id = current[hop.column].as_i64()?;
            current = self.find(hop.table, parent_id)?;
        }
        current[path.owner_column].as_i64()
    }

    fn in_scope(&self, row: &Value, scope: &ListScope) -> bool {
        match scope {
            ListScope::Everything => true,
            ListScope::Nothing => false,
            ListScope::Owned { path, owner_id } => self.owner_of(row, path) == Some(*owner_id),
            ListScope::Matching { column, value } => text_of(&row[*column]) == *value,
        }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches_filter(row: &Value, field: &str, value: &FilterValue) -> bool {
    match value {
        FilterValue::Bool(expected) => row[field].as_bool() == Some(*expected),
        FilterValue::Integer(expected) => row[field].as_i64() == Some(*expected),
        FilterValue::Text(expected) => text_of(&row[field]) == *expected,
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl CollectionRepo for MemoryCollections {
    async fn fetch_page(
        &self,
        descriptor: &ResourceDescriptor,
        query: &CollectionQuery,
    ) -> Result<FetchedRows, RepoError> {
        self.fetches.fetch_add(1, AtomicOrdering::SeqCst);
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(RepoError::Timeout);
        }

        let mut rows: Vec<Value> = self
            .rows(descriptor.table)
            .into_iter()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|f| matches_filter(row, f.field, &f.value))
            })
            .filter(|row| match query.search.as_deref() {
                Some(needle) => descriptor.search_fields.iter().any(|field| {
                    text_of(&row[*field])
                        .to_lowercase()
                        .contains(&needle.to_lowercase())
                }),
                None => true,
            })
            .filter(|row| self.in_scope(row, &query.scope))
            .collect();

        rows.sort_by(|a, b| {
            for term in &query.ordering {
                let ord = compare(&a[term.field], &b[term.field]);
                let ord = if term.descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            compare(&a["id"], &b["id"])
        });

        let total = rows.len() as u64;
        let rows = rows
            .into_iter()
            .skip(query.page.offset as usize)
            .take(query.page.limit as usize)
            .collect();
        Ok(FetchedRows { rows, total })
    }

    async fn find_row(
        &self,
        descriptor: &ResourceDescriptor,
        scope: &ListScope,
        id: i64,
    ) -> Result<Option<Value>, RepoError> {
        Ok(self
            .find(descriptor.table, id)
            .filter(|row| self.in_scope(row, scope)))
    }
}

#[derive(Default)]
pub struct MemoryTokens {
    users: Mutex<HashMap<i64, UserRecord>>,
    tokens: Mutex<Vec<AccessTokenRecord>>,
}

impl MemoryTokens {
    pub async fn add_user(&self, user: UserRecord) {
        self.users.lock().await.insert(user.id, user);
    }

    pub async fn revoke_all(&self) {
        let now = OffsetDateTime::now_utc();
        for token in self.tokens.lock().await.iter_mut() {
            token.revoked_at = Some(now);
        }
    }
}

#[async_trait]
impl AccessTokensRepo for MemoryTokens {
    async fn create_token(
        &self,
        params: CreateAccessTokenParams,
    ) -> Result<AccessTokenRecord, RepoError> {
        let mut tokens = self.tokens.lock().await;
        let record = AccessTokenRecord {
            id: tokens.len() as i64 + 1,
            user_id: params.user_id,
            prefix: params.prefix,
            hashed_secret: params.hashed_secret,
            expires_at: params.expires_at,
            revoked_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        tokens.push(record.clone());
        Ok(record)
    }

    async fn find_token_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<AccessTokenRecord>, RepoError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens.iter().find(|t| t.prefix == prefix).cloned())
    }

    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.users.lock().await.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryReviews {
    reviews: Mutex<Vec<ReviewRecord>>,
}

impl MemoryReviews {
    pub async fn all(&self) -> Vec<ReviewRecord> {
        self.reviews.lock().await.clone()
    }
}

#[async_trait]
impl ReviewsRepo for MemoryReviews {
    async fn review_exists(&self, user_id: i64, product_id: i64) -> Result<bool, RepoError> {
        let reviews = self.reviews.lock().await;
        Ok(reviews
            .iter()
            .any(|r| r.user_id == user_id && r.product_id == product_id))
    }

    async fn create_review(&self, params: CreateReviewParams) -> Result<ReviewRecord, RepoError> {
        let mut reviews = self.reviews.lock().await;
        if reviews
            .iter()
            .any(|r| r.user_id == params.user_id && r.product_id == params.product_id)
        {
            return Err(RepoError::Duplicate {
                constraint: "reviews_user_product_key".to_string(),
            });
        }
        let record = ReviewRecord {
            id: reviews.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            user_id: params.user_id,
            product_id: params.product_id,
            rating: params.rating,
            comment: params.comment,
            created_at: OffsetDateTime::now_utc(),
        };
        reviews.push(record.clone());
        Ok(record)
    }

    async fn find_review(&self, id: i64) -> Result<Option<ReviewRecord>, RepoError> {
        let reviews = self.reviews.lock().await;
        Ok(reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn delete_review(&self, id: i64) -> Result<(), RepoError> {
        let mut reviews = self.reviews.lock().await;
        let before = reviews.len();
        reviews.retain(|r| r.id != id);
        if reviews.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

pub const ALICE_ADDRESS: i64 = 40;
pub const BOB_ADDRESS: i64 = 41;

#[derive(Default)]
struct CartState {
    carts: HashMap<i64, i64>,
    items: Vec<CartItemRecord>,
    wishlists: HashMap<i64, i64>,
    wishlist_items: Vec<WishlistItemRecord>,
}

/// Carts and wishlists over the seeded catalog: variants 1-3 and products 1-3.
pub struct MemoryCarts {
    state: Mutex<CartState>,
    prices: HashMap<i64, i64>,
}

impl Default for MemoryCarts {
    fn default() -> Self {
        let mut state = CartState::default();
        state.carts.insert(ALICE, 20);
        state.carts.insert(BOB, 21);
        state.items.push(CartItemRecord {
            id: 200,
            cart_id: 20,
            variant_id: 1,
            quantity: 2,
            price_cents: 49900,
            created_at: OffsetDateTime::UNIX_EPOCH,
        });
        state.items.push(CartItemRecord {
            id: 201,
            cart_id: 21,
            variant_id: 2,
            quantity: 1,
            price_cents: 1500,
            created_at: OffsetDateTime::UNIX_EPOCH,
        });
        Self {
            state: Mutex::new(state),
            prices: HashMap::from([(1, 49900), (2, 1500), (3, 3200)]),
        }
    }
}

impl MemoryCarts {
    pub async fn cart_items(&self) -> Vec<CartItemRecord> {
        self.state.lock().await.items.clone()
    }

    pub async fn wishlist_items(&self) -> Vec<WishlistItemRecord> {
        self.state.lock().await.wishlist_items.clone()
    }

    pub async fn wishlist_of(&self, user_id: i64) -> Option<i64> {
        self.state.lock().await.wishlists.get(&user_id).copied()
    }
}

fn owned_by(owners: &HashMap<i64, i64>, user_id: i64, parent_id: i64) -> bool {
    owners.get(&user_id) == Some(&parent_id)
}

#[async_trait]
impl CartsRepo for MemoryCarts {
    async fn variant_price(&self, variant_id: i64) -> Result<Option<i64>, RepoError> {
        Ok(self.prices.get(&variant_id).copied())
    }

    async fn ensure_cart(&self, user_id: i64) -> Result<i64, RepoError> {
        let mut state = self.state.lock().await;
        let next = state.carts.values().max().copied().unwrap_or(0) + 1;
        Ok(*state.carts.entry(user_id).or_insert(next))
    }

    async fn add_cart_item(&self, params: AddCartItemParams) -> Result<CartItemRecord, RepoError> {
        let mut state = self.state.lock().await;
        if let Some(item) = state
            .items
            .iter_mut()
            .find(|i| i.cart_id == params.cart_id && i.variant_id == params.variant_id)
        {
            item.quantity += params.quantity;
            return Ok(item.clone());
        }
        let record = CartItemRecord {
            id: state.items.iter().map(|i| i.id).max().unwrap_or(0) + 1,
            cart_id: params.cart_id,
            variant_id: params.variant_id,
            quantity: params.quantity,
            price_cents: params.price_cents,
            created_at: OffsetDateTime::now_utc(),
        };
        state.items.push(record.clone());
        Ok(record)
    }

    async fn delete_cart_item(&self, user_id: i64, item_id: i64) -> Result<bool, RepoError> {
        let mut state = self.state.lock().await;
        let before = state.items.len();
        let carts = state.carts.clone();
        state
            .items
            .retain(|i| !(i.id == item_id && owned_by(&carts, user_id, i.cart_id)));
        Ok(state.items.len() < before)
    }
}

#[async_trait]
impl WishlistsRepo for MemoryCarts {
    async fn product_exists(&self, product_id: i64) -> Result<bool, RepoError> {
        Ok((1..=3).contains(&product_id))
    }

    async fn ensure_wishlist(&self, user_id: i64) -> Result<i64, RepoError> {
        let mut state = self.state.lock().await;
        let next = state.wishlists.values().max().copied().unwrap_or(0) + 1;
        Ok(*state.wishlists.entry(user_id).or_insert(next))
    }

    async fn add_wishlist_item(
        &self,
        wishlist_id: i64,
        product_id: i64,
    ) -> Result<WishlistItemRecord, RepoError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .wishlist_items
            .iter()
            .find(|i| i.wishlist_id == wishlist_id && i.product_id == product_id)
        {
            return Ok(existing.clone());
        }
        let record = WishlistItemRecord {
            id: state.wishlist_items.iter().map(|i| i.id).max().unwrap_or(0) + 1,
            wishlist_id,
            product_id,
            added_at: OffsetDateTime::now_utc(),
        };
        state.wishlist_items.push(record.clone());
        Ok(record)
    }

    async fn delete_wishlist_item(&self, user_id: i64, item_id: i64) -> Result<bool, RepoError> {
        let mut state = self.state.lock().await;
        let before = state.wishlist_items.len();
        let wishlists = state.wishlists.clone();
        state
            .wishlist_items
            .retain(|i| !(i.id == item_id && owned_by(&wishlists, user_id, i.wishlist_id)));
        Ok(state.wishlist_items.len() < before)
    }
}

/// Orders placed on top of the three seeded ones.
pub struct MemoryOrders {
    addresses: HashMap<i64, i64>,
    seeded: u64,
    orders: Mutex<Vec<OrderRecord>>,
}

impl Default for MemoryOrders {
    fn default() -> Self {
        Self {
            addresses: HashMap::from([(ALICE_ADDRESS, ALICE), (BOB_ADDRESS, BOB)]),
            seeded: 3,
            orders: Mutex::new(Vec::new()),
        }
    }
}

impl MemoryOrders {
    pub async fn all(&self) -> Vec<OrderRecord> {
        self.orders.lock().await.clone()
    }
}

#[async_trait]
impl OrdersRepo for MemoryOrders {
    async fn address_owner(&self, address_id: i64) -> Result<Option<i64>, RepoError> {
        Ok(self.addresses.get(&address_id).copied())
    }

    async fn count_orders(&self) -> Result<u64, RepoError> {
        Ok(self.seeded + self.orders.lock().await.len() as u64)
    }

    async fn create_order(&self, params: CreateOrderParams) -> Result<OrderRecord, RepoError> {
        let mut orders = self.orders.lock().await;
        if orders.iter().any(|o| o.order_number == params.order_number) {
            return Err(RepoError::Duplicate {
                constraint: "orders_order_number_key".to_string(),
            });
        }
        let record = OrderRecord {
            id: 13 + orders.len() as i64,
            user_id: params.user_id,
            address_id: Some(params.address_id),
            order_number: params.order_number,
            total_amount_cents: 0,
            payment_status: PaymentStatus::Pending,
            payment_method: params.payment_method,
            order_date: OffsetDateTime::now_utc(),
            shipped_date: None,
        };
        orders.push(record.clone());
        Ok(record)
    }
}

#[derive(Default)]
pub struct MemoryServiceChecks {
    checks: Mutex<Vec<ServiceCheckRecord>>,
}

impl MemoryServiceChecks {
    pub async fn all(&self) -> Vec<ServiceCheckRecord> {
        self.checks.lock().await.clone()
    }
}

#[async_trait]
impl ServiceChecksRepo for MemoryServiceChecks {
    async fn record_check(&self, check: NewServiceCheck) -> Result<ServiceCheckRecord, RepoError> {
        let mut checks = self.checks.lock().await;
        let record = ServiceCheckRecord {
            id: checks.len() as i64 + 1,
            service_name: check.service_name,
            success: check.success,
            http_status_code: check.http_status_code,
            response_time_ms: check.response_time_ms,
            checked_at: check.checked_at,
            error: check.error,
        };
        checks.push(record.clone());
        Ok(record)
    }
}

pub struct AlwaysReady;

#[async_trait]
impl ReadinessCheck for AlwaysReady {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

pub fn user_record(id: i64, username: &str, role: UserRole) -> UserRecord {
    UserRecord {
        id,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: username.to_string(),
        last_name: "Tester".to_string(),
        phone: None,
        role,
    }
}

pub fn caller(id: i64, role: UserRole) -> Caller {
    Caller::User(Principal::new(id, format!("user{id}"), role))
}

/// Seed rows shared by the integration suites.
pub fn seed(collections: &MemoryCollections) {
    collections.insert(
        "users",
        vec![
            json!({"id": ALICE, "username": "alice", "email": "alice@example.com", "role": "customer"}),
            json!({"id": BOB, "username": "bob", "email": "bob@example.com", "role": "customer"}),
            json!({"id": ADMIN, "username": "root", "email": "root@example.com", "role": "admin"}),
            json!({"id": VENDOR, "username": "vera", "email": "vera@example.com", "role": "vendor"}),
        ],
    );
    collections.insert(
        "products",
        vec![
            json!({"id": 1, "name": "Phone", "description": "Smart phone", "brand": "acme", "sku": "P-1", "price_cents": 49900, "is_active": true, "category_id": 1, "date_added": "2024-01-01T00:00:00Z", "stock_quantity": 5}),
            json!({"id": 2, "name": "Case", "description": "Phone case", "brand": "acme", "sku": "P-2", "price_cents": 1500, "is_active": true, "category_id": 1, "date_added": "2024-02-01T00:00:00Z", "stock_quantity": 50}),
            json!({"id": 3, "name": "Lamp", "description": "Desk lamp", "brand": "lumo", "sku": "P-3", "price_cents": 3200, "is_active": false, "category_id": 2, "date_added": "2024-03-01T00:00:00Z", "stock_quantity": 0}),
        ],
    );
    collections.insert(
        "orders",
        vec![
            json!({"id": 10, "user_id": ALICE, "order_number": "ORD-10", "total_amount_cents": 49900, "payment_status": "completed", "payment_method": "card", "order_date": "2024-03-01T10:00:00Z"}),
            json!({"id": 11, "user_id": ALICE, "order_number": "ORD-11", "total_amount_cents": 1500, "payment_status": "pending", "payment_method": "mpesa", "order_date": "2024-03-02T10:00:00Z"}),
            json!({"id": 12, "user_id": BOB, "order_number": "ORD-12", "total_amount_cents": 3200, "payment_status": "pending", "payment_method": "cod", "order_date": "2024-03-03T10:00:00Z"}),
        ],
    );
    collections.insert(
        "order_items",
        vec![
            json!({"id": 100, "order_id": 10, "variant_id": 1, "quantity": 1, "subtotal_cents": 49900}),
            json!({"id": 101, "order_id": 12, "variant_id": 3, "quantity": 1, "subtotal_cents": 3200}),
        ],
    );
    collections.insert(
        "carts",
        vec![
            json!({"id": 20, "user_id": ALICE, "created_at": "2024-03-01T00:00:00Z"}),
            json!({"id": 21, "user_id": BOB, "created_at": "2024-03-01T00:00:00Z"}),
        ],
    );
    collections.insert(
        "cart_items",
        vec![
            json!({"id": 200, "cart_id": 20, "variant_id": 1, "quantity": 2, "created_at": "2024-03-01T00:00:00Z"}),
            json!({"id": 201, "cart_id": 21, "variant_id": 2, "quantity": 1, "created_at": "2024-03-01T00:00:00Z"}),
        ],
    );
    collections.insert(
        "reviews",
        vec![
            json!({"id": 300, "user_id": ALICE, "product_id": 1, "rating": 5, "comment": "great", "created_at": "2024-03-05T00:00:00Z"}),
            json!({"id": 301, "user_id": BOB, "product_id": 1, "rating": 2, "comment": "meh", "created_at": "2024-03-06T00:00:00Z"}),
        ],
    );
}

/// Service graph backed entirely by in-memory fakes and a manual clock.
pub struct Harness {
    pub collections: Arc<MemoryCollections>,
    pub tokens_repo: Arc<MemoryTokens>,
    pub reviews_repo: Arc<MemoryReviews>,
    pub carts_repo: Arc<MemoryCarts>,
    pub orders_repo: Arc<MemoryOrders>,
    pub checks_repo: Arc<MemoryServiceChecks>,
    pub clock: Arc<ManualClock>,
    pub store: Arc<dyn ResponseStore>,
    pub lists: Arc<ListService>,
    pub tokens: Arc<TokenService>,
    pub reviews: Arc<ReviewService>,
    pub carts: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub monitor: Arc<HealthMonitor>,
}

impl Harness {
    pub async fn new(cache: CacheConfig) -> Self {
        let collections = Arc::new(MemoryCollections::default());
        seed(&collections);

        let tokens_repo = Arc::new(MemoryTokens::default());
        for user in [
            user_record(ALICE, "alice", UserRole::Customer),
            user_record(BOB, "bob", UserRole::Customer),
            user_record(ADMIN, "root", UserRole::Admin),
            user_record(VENDOR, "vera", UserRole::Vendor),
        ] {
            tokens_repo.add_user(user).await;
        }

        let reviews_repo = Arc::new(MemoryReviews::default());
        let carts_repo = Arc::new(MemoryCarts::default());
        let orders_repo = Arc::new(MemoryOrders::default());
        let checks_repo = Arc::new(MemoryServiceChecks::default());
        let clock = Arc::new(ManualClock::new());
        let store: Arc<dyn ResponseStore> =
            Arc::new(MemoryResponseStore::with_clock(&cache, clock.clone()));

        let lists = Arc::new(ListService::new(
            collections.clone(),
            store.clone(),
            cache,
            PageLimits::default(),
        ));
        let tokens = Arc::new(TokenService::new(tokens_repo.clone()));
        let reviews = Arc::new(ReviewService::new(reviews_repo.clone()));
        let carts = Arc::new(CartService::new(carts_repo.clone(), carts_repo.clone()));
        let orders = Arc::new(OrderService::new(orders_repo.clone()));
        let monitor = Arc::new(
            HealthMonitor::new(
                checks_repo.clone(),
                Vec::new(),
                std::time::Duration::from_secs(2),
            )
            .expect("monitor client"),
        );

        Self {
            collections,
            tokens_repo,
            reviews_repo,
            carts_repo,
            orders_repo,
            checks_repo,
            clock,
            store,
            lists,
            tokens,
            reviews,
            carts,
            orders,
            monitor,
        }
    }

    pub fn router_state(&self) -> RouterState {
        RouterState {
            api: ApiState {
                lists: self.lists.clone(),
                tokens: self.tokens.clone(),
                reviews: self.reviews.clone(),
                carts: self.carts.clone(),
                orders: self.orders.clone(),
                monitor: self.monitor.clone(),
            },
            readiness: Arc::new(AlwaysReady),
        }
    }

    pub fn router(&self) -> axum::Router {
        storefront::infra::http::build_router(self.router_state())
    }

    /// Issue a bearer token for a seeded user.
    pub async fn token_for(&self, user_id: i64) -> String {
        self.tokens
            .issue(user_id, None)
            .await
            .expect("issue token")
            .token
    }
}
