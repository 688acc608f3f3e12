//! Offset pagination with opaque cursors.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct OffsetCursorPayload {
    offset: u64,
}

/// Cursor pointing at a row offset within an ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetCursor {
    offset: u64,
}

impl OffsetCursor {
    pub fn new(offset: u64) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn encode(&self) -> String {
        let payload = OffsetCursorPayload {
            offset: self.offset,
        };
        let serialized = serde_json::to_vec(&payload)
            .expect("serializing offset cursor payload should succeed");
        URL_SAFE_NO_PAD.encode(serialized)
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let payload: OffsetCursorPayload = serde_json::from_slice(&bytes)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        Ok(Self {
            offset: payload.offset,
        })
    }
}

/// Bounds applied to caller-supplied page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
}

impl PageRequest {
    pub fn new(limit: u32, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// Resolve `limit`/`cursor` query values. A non-numeric limit falls back
    /// to the default; an undecodable cursor is an error.
    pub fn from_query(
        limit: Option<&str>,
        cursor: Option<&str>,
        limits: PageLimits,
    ) -> Result<Self, PaginationError> {
        let max = limits.max_limit.max(1);
        let limit = limit
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(limits.default_limit)
            .clamp(1, max);
        let offset = match cursor.filter(|raw| !raw.is_empty()) {
            Some(raw) => OffsetCursor::decode(raw)?.offset(),
            None => 0,
        };
        Ok(Self { limit, offset })
    }
}

/// Paginated collection response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionPage<T> {
    pub count: u64,
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub previous_cursor: Option<String>,
}

impl<T> CollectionPage<T> {
    pub fn empty() -> Self {
        Self {
            count: 0,
            items: Vec::new(),
            next_cursor: None,
            previous_cursor: None,
        }
    }

    /// Assemble a page from one slice of rows and the exact total.
    pub fn from_slice(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let end = request.offset + items.len() as u64;
        let next_cursor = (end < total).then(|| OffsetCursor::new(end).encode());
        let previous_cursor = (request.offset > 0).then(|| {
            OffsetCursor::new(request.offset.saturating_sub(u64::from(request.limit))).encode()
        });
        Self {
            count: total,
            items,
            next_cursor,
            previous_cursor,
        }
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_cursor_round_trip() {
        let cursor = OffsetCursor::new(40);
        let decoded = OffsetCursor::decode(&cursor.encode()).expect("decode");
        assert_eq!(decoded.offset(), 40);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = OffsetCursor::decode("not-a-cursor!").unwrap_err();
        assert!(matches!(err, PaginationError::InvalidCursor(_)));
    }

    #[test]
    fn limit_is_clamped_and_defaults_on_garbage() {
        let limits = PageLimits::default();
        assert_eq!(
            PageRequest::from_query(Some("500"), None, limits)
                .expect("request")
                .limit,
            100
        );
        assert_eq!(
            PageRequest::from_query(Some("0"), None, limits)
                .expect("request")
                .limit,
            1
        );
        assert_eq!(
            PageRequest::from_query(Some("ten"), None, limits)
                .expect("request")
                .limit,
            20
        );
    }

    #[test]
    fn page_links_follow_offsets() {
        let page = CollectionPage::from_slice(vec![1, 2], 5, PageRequest::new(2, 2));
        assert_eq!(page.count, 5);
        let next = OffsetCursor::decode(page.next_cursor.as_deref().expect("next")).expect("next");
        let prev = OffsetCursor::decode(page.previous_cursor.as_deref().expect("prev"))
            .expect("prev");
        assert_eq!(next.offset(), 4);
        assert_eq!(prev.offset(), 0);

        let last = CollectionPage::from_slice(vec![5], 5, PageRequest::new(2, 4));
        assert!(last.next_cursor.is_none());
    }
}
