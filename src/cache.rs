//! Short-lived cache of rendered list responses, kept in Redis.

use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};

pub const KEY_PREFIX: &str = "CACHED";

/// A stored response: status and JSON body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPage {
    pub status: u16,
    pub body: String,
}

impl IntoResponse for CachedPage {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, [(header::CONTENT_TYPE, "application/json")], self.body).into_response()
    }
}

impl CachedPage {
    /// Only successful pages are stored.
    pub fn is_cacheable(&self) -> bool { self.status == StatusCode::OK.as_u16() }
}

pub fn page_key(prefix: &str, uri: &str) -> String {
    format!("{KEY_PREFIX}:{prefix}:{uri}")
}

#[derive(Clone)]
pub struct PageCache {
    conn: Option<ConnectionManager>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(conn: Option<ConnectionManager>, ttl: Duration) -> Self { Self { conn, ttl } }

    pub fn disabled() -> Self { Self { conn: None, ttl: Duration::ZERO } }

    pub fn ttl(&self) -> Duration { self.ttl }

    /// Cached page, if any. Redis failures count as a miss.
    pub async fn get(&self, prefix: &str, uri: &str) -> Option<CachedPage> {
        let mut conn = self.conn.clone()?;
        let raw: Option<String> = match redis::cmd("GET").arg(page_key(prefix, uri)).query_async(&mut conn).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, prefix, "page cache read failed");
                return None;
            }
        };
        raw.and_then(|r| serde_json::from_str(&r).ok())
    }

    pub async fn put(&self, prefix: &str, uri: &str, page: &CachedPage, ttl: Duration) {
        if ttl.is_zero() || !page.is_cacheable() { return; }
        let Some(mut conn) = self.conn.clone() else { return };
        let Ok(raw) = serde_json::to_string(page) else { return };
        let result: Result<(), redis::RedisError> = redis::cmd("SET")
            .arg(page_key(prefix, uri))
            .arg(raw)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, prefix, "page cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_key() {
        assert_eq!(page_key("PRODUCTS_LIST", "/api/v1/products?page=2"), "CACHED:PRODUCTS_LIST:/api/v1/products?page=2");
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache = PageCache::disabled();
        let page = CachedPage { status: 200, body: "[]".into() };
        cache.put("X", "/x", &page, Duration::from_secs(60)).await;
        assert!(cache.get("X", "/x").await.is_none());
    }

    #[test]
    fn test_only_ok_pages_cacheable() {
        assert!(CachedPage { status: 200, body: "[]".into() }.is_cacheable());
        assert!(!CachedPage { status: 400, body: "{}".into() }.is_cacheable());
        assert!(!CachedPage { status: 404, body: "{}".into() }.is_cacheable());
    }

    #[test]
    fn test_cached_page_response_keeps_status() {
        let response = CachedPage { status: 400, body: "{}".into() }.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}
