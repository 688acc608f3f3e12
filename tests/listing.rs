mod common;

use std::time::Duration;

use serde_json::Value;

use storefront::application::access::Caller;
use storefront::application::listing::{CacheStatus, ListError};
use storefront::application::policy::{AccessError, Capability};
use storefront::application::query::QueryParams;
use storefront::application::repos::RepoError;
use storefront::cache::{CacheConfig, generate_key};
use storefront::domain::resources::ResourceKind;
use storefront::domain::types::UserRole;

use common::{ALICE, BOB, Harness, VENDOR, caller};

fn params(pairs: &[(&str, &str)]) -> QueryParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn page(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("page json")
}

fn ids(page: &Value) -> Vec<i64> {
    page["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|row| row["id"].as_i64().expect("id"))
        .collect()
}

#[tokio::test]
async fn second_identical_request_is_served_from_cache() {
    let harness = Harness::new(CacheConfig::default()).await;
    let query = params(&[("is_active", "true"), ("ordering", "price_cents")]);

    let first = harness
        .lists
        .list(ResourceKind::Products, &Caller::Anonymous, &query)
        .await
        .expect("first");
    let second = harness
        .lists
        .list(ResourceKind::Products, &Caller::Anonymous, &query)
        .await
        .expect("second");

    assert_eq!(first.cache, CacheStatus::Miss);
    assert_eq!(second.cache, CacheStatus::Hit);
    assert_eq!(first.body, second.body);
    assert_eq!(harness.collections.fetch_count(), 1);
    assert_eq!(ids(&page(&first.body)), vec![2, 1]);
}

#[tokio::test]
async fn entry_expires_after_ttl() {
    let harness = Harness::new(CacheConfig::default()).await;
    let query = params(&[]);

    harness
        .lists
        .list(ResourceKind::Products, &Caller::Anonymous, &query)
        .await
        .expect("prime");

    harness.clock.advance(Duration::from_secs(299));
    let cached = harness
        .lists
        .list(ResourceKind::Products, &Caller::Anonymous, &query)
        .await
        .expect("cached");
    assert_eq!(cached.cache, CacheStatus::Hit);

    harness.clock.advance(Duration::from_secs(2));
    let refreshed = harness
        .lists
        .list(ResourceKind::Products, &Caller::Anonymous, &query)
        .await
        .expect("refreshed");
    assert_eq!(refreshed.cache, CacheStatus::Miss);
    assert_eq!(harness.collections.fetch_count(), 2);
}

#[tokio::test]
async fn orders_scenario_with_long_ttl() {
    let harness = Harness::new(CacheConfig::default().with_ttl("orders", 600)).await;
    let query = params(&[]);

    let alice = harness
        .lists
        .list(ResourceKind::Orders, &caller(ALICE, UserRole::Customer), &query)
        .await
        .expect("alice");
    let bob = harness
        .lists
        .list(ResourceKind::Orders, &caller(BOB, UserRole::Customer), &query)
        .await
        .expect("bob");
    let anonymous = harness
        .lists
        .list(ResourceKind::Orders, &Caller::Anonymous, &query)
        .await
        .expect("anonymous");

    assert_eq!(page(&alice.body)["count"], 2);
    assert_eq!(page(&bob.body)["count"], 1);
    assert_eq!(page(&anonymous.body)["count"], 0);
    assert_eq!(anonymous.cache, CacheStatus::Bypass);
    assert_eq!(ids(&page(&alice.body)), vec![11, 10]);

    harness.clock.advance(Duration::from_secs(500));
    let again = harness
        .lists
        .list(ResourceKind::Orders, &caller(ALICE, UserRole::Customer), &query)
        .await
        .expect("alice again");
    assert_eq!(again.cache, CacheStatus::Hit);
    assert_eq!(harness.collections.fetch_count(), 2);
}

#[tokio::test]
async fn owners_never_share_cache_entries() {
    let harness = Harness::new(CacheConfig::default()).await;
    let query = params(&[]);

    let alice = harness
        .lists
        .list(ResourceKind::CartItems, &caller(ALICE, UserRole::Customer), &query)
        .await
        .expect("alice");
    let bob = harness
        .lists
        .list(ResourceKind::CartItems, &caller(BOB, UserRole::Customer), &query)
        .await
        .expect("bob");

    assert_eq!(bob.cache, CacheStatus::Miss);
    assert_eq!(ids(&page(&alice.body)), vec![200]);
    assert_eq!(ids(&page(&bob.body)), vec![201]);
}

#[tokio::test]
async fn introspection_never_reaches_owned_storage() {
    let harness = Harness::new(CacheConfig::default()).await;

    for kind in [
        ResourceKind::Orders,
        ResourceKind::CartItems,
        ResourceKind::Reviews,
        ResourceKind::Users,
    ] {
        let outcome = harness
            .lists
            .list(kind, &Caller::SchemaProbe, &params(&[]))
            .await
            .expect("introspection");
        assert_eq!(outcome.cache, CacheStatus::Bypass);
        assert_eq!(page(&outcome.body)["count"], 0);
    }

    assert_eq!(harness.collections.fetch_count(), 0);
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn introspection_reads_public_collections_like_anonymous() {
    let harness = Harness::new(CacheConfig::default()).await;

    let introspection = harness
        .lists
        .list(ResourceKind::Products, &Caller::SchemaProbe, &params(&[]))
        .await
        .expect("introspection");
    let anonymous = harness
        .lists
        .list(ResourceKind::Products, &Caller::Anonymous, &params(&[]))
        .await
        .expect("anonymous");

    assert_eq!(introspection.cache, CacheStatus::Miss);
    assert_eq!(anonymous.cache, CacheStatus::Hit);
    assert_eq!(page(&introspection.body)["count"], 3);

    let err = harness
        .lists
        .list(ResourceKind::Inventory, &Caller::SchemaProbe, &params(&[]))
        .await
        .expect_err("capability gate still applies");
    assert!(matches!(err, ListError::Access(AccessError::Unauthenticated)));
}

#[tokio::test]
async fn anonymous_users_list_is_empty() {
    let harness = Harness::new(CacheConfig::default()).await;

    let outcome = harness
        .lists
        .list(ResourceKind::Users, &Caller::Anonymous, &QueryParams::new())
        .await
        .expect("anonymous users list");

    assert_eq!(outcome.cache, CacheStatus::Bypass);
    assert_eq!(page(&outcome.body)["count"], 0);
    assert_eq!(harness.collections.fetch_count(), 0);

    let missing = harness
        .lists
        .retrieve(ResourceKind::Users, &Caller::Anonymous, ALICE)
        .await;
    assert!(matches!(missing, Err(ListError::NotFound(ResourceKind::Users))));
}

#[tokio::test]
async fn storage_errors_propagate_and_are_not_cached() {
    let harness = Harness::new(CacheConfig::default()).await;
    let query = params(&[("is_active", "true")]);

    harness.collections.set_unavailable(true);
    let err = harness
        .lists
        .list(ResourceKind::Products, &Caller::Anonymous, &query)
        .await
        .expect_err("storage failure");
    assert!(matches!(err, ListError::Repo(RepoError::Timeout)));
    assert!(harness.store.is_empty());

    harness.collections.set_unavailable(false);
    let recovered = harness
        .lists
        .list(ResourceKind::Products, &Caller::Anonymous, &query)
        .await
        .expect("recovered");
    assert_eq!(recovered.cache, CacheStatus::Miss);
    assert_eq!(page(&recovered.body)["count"], 2);
    assert_eq!(harness.collections.fetch_count(), 2);
}

#[tokio::test]
async fn unknown_filter_fields_are_ignored_but_keyed() {
    let harness = Harness::new(CacheConfig::default()).await;

    let plain = harness
        .lists
        .list(ResourceKind::Products, &Caller::Anonymous, &params(&[]))
        .await
        .expect("plain");
    let bogus = harness
        .lists
        .list(
            ResourceKind::Products,
            &Caller::Anonymous,
            &params(&[("bogus_field", "x")]),
        )
        .await
        .expect("bogus");

    assert_eq!(bogus.cache, CacheStatus::Miss);
    assert_eq!(page(&plain.body)["count"], page(&bogus.body)["count"]);
    assert!(
        harness
            .store
            .get(&generate_key("products", [("bogus_field", "x")]))
            .is_some()
    );
}

#[tokio::test]
async fn search_and_pagination_compose() {
    let harness = Harness::new(CacheConfig::default()).await;

    let first = harness
        .lists
        .list(
            ResourceKind::Products,
            &Caller::Anonymous,
            &params(&[("search", "phone"), ("limit", "1"), ("ordering", "name")]),
        )
        .await
        .expect("first page");
    let first = page(&first.body);
    assert_eq!(first["count"], 2);
    assert_eq!(ids(&first), vec![2]);

    let cursor = first["next_cursor"].as_str().expect("next cursor").to_string();
    let second = harness
        .lists
        .list(
            ResourceKind::Products,
            &Caller::Anonymous,
            &params(&[
                ("search", "phone"),
                ("limit", "1"),
                ("ordering", "name"),
                ("cursor", cursor.as_str()),
            ]),
        )
        .await
        .expect("second page");
    let second = page(&second.body);
    assert_eq!(ids(&second), vec![1]);
    assert!(second["next_cursor"].is_null());
    assert!(second["previous_cursor"].is_string());
}

#[tokio::test]
async fn invalid_cursor_is_rejected_and_not_cached() {
    let harness = Harness::new(CacheConfig::default()).await;
    let query = params(&[("cursor", "not-a-cursor")]);

    let err = harness
        .lists
        .list(ResourceKind::Products, &Caller::Anonymous, &query)
        .await
        .expect_err("bad cursor");
    assert!(matches!(err, ListError::Pagination(_)));
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn role_gates_apply_before_scoping() {
    let harness = Harness::new(CacheConfig::default()).await;

    let err = harness
        .lists
        .list(
            ResourceKind::Users,
            &caller(ALICE, UserRole::Customer),
            &params(&[]),
        )
        .await
        .expect_err("customers cannot list users");
    assert!(matches!(
        err,
        ListError::Access(AccessError::Forbidden(Capability::ViewUsers))
    ));

    let vendor = harness
        .lists
        .list(
            ResourceKind::Users,
            &caller(VENDOR, UserRole::Vendor),
            &params(&[]),
        )
        .await
        .expect("vendor sees customers");
    let vendor = page(&vendor.body);
    assert_eq!(vendor["count"], 2);
}

#[tokio::test]
async fn retrieve_respects_ownership() {
    let harness = Harness::new(CacheConfig::default()).await;

    let own = harness
        .lists
        .retrieve(ResourceKind::Orders, &caller(ALICE, UserRole::Customer), 10)
        .await
        .expect("own order");
    assert_eq!(own["order_number"], "ORD-10");

    let foreign = harness
        .lists
        .retrieve(ResourceKind::Orders, &caller(ALICE, UserRole::Customer), 12)
        .await;
    assert!(matches!(foreign, Err(ListError::NotFound(ResourceKind::Orders))));

    let nested = harness
        .lists
        .retrieve(ResourceKind::OrderItems, &caller(BOB, UserRole::Customer), 101)
        .await
        .expect("order item through order");
    assert_eq!(nested["order_id"], 12);
}
