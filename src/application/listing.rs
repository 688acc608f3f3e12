//! Composed list endpoint shared by every registered collection.
//!
//! A list request is authorized, filtered, ordered, narrowed to the caller's
//! scope, then served from the response cache or computed and stored.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use metrics::{counter, histogram};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::application::access::{self, Caller, ListScope};
use crate::application::pagination::{CollectionPage, PageLimits, PaginationError};
use crate::application::policy::{self, AccessError, Action};
use crate::application::query::{CollectionQuery, QueryParams};
use crate::application::repos::{CollectionRepo, RepoError};
use crate::cache::{CacheConfig, ResponseStore, SCOPE_PARAM, generate_key};
use crate::domain::resources::{ResourceDescriptor, ResourceKind};

const METRIC_CACHE_HIT: &str = "storefront_list_cache_hit_total";
const METRIC_CACHE_MISS: &str = "storefront_list_cache_miss_total";
const METRIC_CACHE_STORE: &str = "storefront_list_cache_store_total";
const METRIC_QUERY_MS: &str = "storefront_list_query_ms";

#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("failed to serialize collection page: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("{0} record not found")]
    NotFound(ResourceKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// The response never touched the cache (empty scope).
    Bypass,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Bypass => "bypass",
        }
    }
}

/// Serialized page body plus how it was obtained.
#[derive(Debug, Clone)]
pub struct ListOutcome {
    pub body: Bytes,
    pub cache: CacheStatus,
}

#[derive(Clone)]
pub struct ListService {
    repo: Arc<dyn CollectionRepo>,
    store: Arc<dyn ResponseStore>,
    cache: CacheConfig,
    limits: PageLimits,
}

impl ListService {
    pub fn new(
        repo: Arc<dyn CollectionRepo>,
        store: Arc<dyn ResponseStore>,
        cache: CacheConfig,
        limits: PageLimits,
    ) -> Self {
        Self {
            repo,
            store,
            cache,
            limits,
        }
    }

    #[instrument(level = "debug", skip_all, fields(resource = %resource))]
    pub async fn list(
        &self,
        resource: ResourceKind,
        caller: &Caller,
        params: &QueryParams,
    ) -> Result<ListOutcome, ListError> {
        let descriptor = resource.descriptor();
        let scope = access::resolve_scope(descriptor, caller);
        if needs_authorization(caller, &scope) {
            policy::authorize(caller, resource, Action::List)?;
        }

        let query = CollectionQuery::from_params(descriptor, params, self.limits, scope)?;
        if query.scope.is_nothing() {
            return Ok(ListOutcome {
                body: Bytes::from(serde_json::to_vec(&CollectionPage::<Value>::empty())?),
                cache: CacheStatus::Bypass,
            });
        }

        let key = cache_key(descriptor, params, &query.scope);
        if let Some(body) = self.store.get(&key) {
            counter!(METRIC_CACHE_HIT, "resource" => descriptor.cache_prefix).increment(1);
            debug!(key = %key, "collection served from cache");
            return Ok(ListOutcome {
                body,
                cache: CacheStatus::Hit,
            });
        }
        counter!(METRIC_CACHE_MISS, "resource" => descriptor.cache_prefix).increment(1);

        let started = Instant::now();
        let fetched = self.repo.fetch_page(descriptor, &query).await?;
        histogram!(METRIC_QUERY_MS, "resource" => descriptor.cache_prefix)
            .record(started.elapsed().as_secs_f64() * 1000.0);

        let page = CollectionPage::from_slice(fetched.rows, fetched.total, query.page);
        let body = Bytes::from(serde_json::to_vec(&page)?);

        let ttl = self.cache.ttl_for(descriptor.cache_prefix);
        self.store.set(key, body.clone(), ttl);
        counter!(METRIC_CACHE_STORE, "resource" => descriptor.cache_prefix).increment(1);

        Ok(ListOutcome {
            body,
            cache: CacheStatus::Miss,
        })
    }

    /// Fetch one row by id under the same scope a list request would use.
    pub async fn retrieve(
        &self,
        resource: ResourceKind,
        caller: &Caller,
        id: i64,
    ) -> Result<Value, ListError> {
        let descriptor = resource.descriptor();
        let scope = access::resolve_scope(descriptor, caller);
        if needs_authorization(caller, &scope) {
            policy::authorize(caller, resource, Action::Retrieve)?;
        }
        if scope.is_nothing() {
            return Err(ListError::NotFound(resource));
        }

        self.repo
            .find_row(descriptor, &scope, id)
            .await?
            .ok_or(ListError::NotFound(resource))
    }
}

/// Callers without a principal that resolve to an empty scope get an empty
/// result without consulting the capability table.
fn needs_authorization(caller: &Caller, scope: &ListScope) -> bool {
    caller.principal().is_some() || !scope.is_nothing()
}

/// Key over every raw parameter, plus the resolved scope for owned resources.
fn cache_key(descriptor: &ResourceDescriptor, params: &QueryParams, scope: &ListScope) -> String {
    let label = descriptor
        .is_principal_scoped()
        .then(|| scope.cache_label());
    let scope_entry = label.as_deref().map(|label| (SCOPE_PARAM, label));
    generate_key(
        descriptor.cache_prefix,
        params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(scope_entry),
    )
}
