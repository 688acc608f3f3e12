//! Cache key derivation for collection responses.
//!
//! A key is `"{prefix}:{fingerprint}"` where the fingerprint is computed over
//! the canonical JSON form of the request parameters with names sorted, so
//! parameter order never affects the key.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

/// Reserved parameter carrying the resolved ownership scope of a request.
///
/// Callers cannot collide with it: `~` never appears in a field name.
pub const SCOPE_PARAM: &str = "~scope";

/// Width of the hex fingerprint appended to the prefix.
const FINGERPRINT_LEN: usize = 32;

/// Derive the response-cache key for `prefix` and a set of query parameters.
///
/// Repeated names keep the last value, matching how query strings are decoded.
pub fn generate_key<I, K, V>(prefix: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let canonical: BTreeMap<String, String> = params
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned()))
        .collect();
    format!("{prefix}:{}", fingerprint(&canonical))
}

fn fingerprint(canonical: &BTreeMap<String, String>) -> String {
    // A map of strings always serializes.
    let serialized = serde_json::to_vec(canonical).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&serialized);
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(FINGERPRINT_LEN);
    digest
}
