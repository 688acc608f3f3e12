//! Response cache for collection endpoints.
//!
//! Serialized list pages are stored under a key derived from the resource
//! prefix and the request parameters, and served until their TTL elapses:
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 1024
//! default_ttl_seconds = 300
//!
//! [cache.ttl_seconds]
//! orders = 600
//! ```

mod clock;
mod config;
mod keys;
mod lock;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use keys::{SCOPE_PARAM, generate_key};
pub use store::{MemoryResponseStore, NoopResponseStore, ResponseStore, build_store};
