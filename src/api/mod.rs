//! REST surface consumed by the storefront.

pub mod catalog;
pub mod content;
pub mod orders;
pub mod products;

use std::future::Future;
use std::time::Duration;

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::{CachedPage, PageCache};
use crate::notify::Notifier;
use crate::recommendations::Recommender;
use crate::ShopError;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: PageCache,
    pub recommender: Recommender,
    pub notifier: Notifier,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/products", get(products::list_products))
        .route("/products/:id", get(products::get_product))
        .route("/products/:id/accompanying_goods", get(products::accompanying_goods))
        .route("/brands", get(catalog::list_brands))
        .route("/brands/:id", get(catalog::get_brand))
        .route("/animals", get(catalog::list_animals))
        .route("/animals/:id", get(catalog::get_animal))
        .route("/categories", get(catalog::list_categories))
        .route("/options", get(catalog::list_options))
        .route("/options/:id", get(catalog::get_option))
        .route("/articles", get(content::list_articles))
        .route("/articles/:id", get(content::get_article))
        .route("/comments", get(content::list_comments).post(content::create_comment))
        .route("/shop-info", get(content::shop_info))
        .route("/order", axum::routing::post(orders::create_order))
        .route("/order/call_back", axum::routing::post(orders::call_back))
        .route("/discounts", get(orders::list_discounts));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "zoo-shop"})) }))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let body = match &self {
            ShopError::OutOfStock(items) => serde_json::json!({"error": self.to_string(), "items": items}),
            ShopError::PriceMismatch { expected, actual } => {
                serde_json::json!({"error": self.to_string(), "expected": expected, "actual": actual})
            }
            _ => serde_json::json!({"error": self.to_string()}),
        };
        let status = match &self {
            ShopError::NotFound(_) | ShopError::UnknownArticle(_) => StatusCode::NOT_FOUND,
            ShopError::Validation(_) | ShopError::PriceMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ShopError::OutOfStock(_) => StatusCode::CONFLICT,
            ShopError::Database(e) => {
                tracing::error!(error = %e, "database error");
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"error": "internal error"}))).into_response();
            }
            ShopError::Storage(e) => {
                tracing::error!(error = %e, "storage error");
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"error": "internal error"}))).into_response();
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Serve from the page cache, or run `load` and cache its rendering.
pub(crate) async fn cached<T, F>(state: &AppState, prefix: &'static str, uri: &Uri, ttl: Duration, load: F) -> Result<Response, ShopError>
where
    T: Serialize,
    F: Future<Output = Result<(StatusCode, T), ShopError>>,
{
    let key = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or_else(|| uri.path());
    if let Some(page) = state.cache.get(prefix, key).await {
        return Ok(page.into_response());
    }
    let (status, value) = load.await?;
    let body = serde_json::to_string(&value).map_err(|e| ShopError::Storage(e.to_string()))?;
    let page = CachedPage { status: status.as_u16(), body };
    if page.is_cacheable() {
        state.cache.put(prefix, key, &page, ttl).await;
    }
    Ok(page.into_response())
}

/// Page of results in the storefront's pagination envelope.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub page_number: u32,
    pub products_on_page: usize,
    pub total_products: usize,
    pub total_pages: u32,
    pub max_products_on_page: u32,
    pub results: Vec<T>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

pub fn paginate<T>(items: Vec<T>, page: Option<u32>, page_size: Option<u32>) -> Result<Page<T>, ShopError> {
    let page_size = page_size.filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let page = page.unwrap_or(1);
    let total = items.len();
    let total_pages = u32::try_from(total.div_ceil(page_size as usize)).unwrap_or(u32::MAX).max(1);
    if page == 0 || page > total_pages { return Err(ShopError::NotFound("page")); }

    let start = (page - 1) as usize * page_size as usize;
    let results: Vec<T> = items.into_iter().skip(start).take(page_size as usize).collect();
    Ok(Page {
        page_number: page,
        products_on_page: results.len(),
        total_products: total,
        total_pages,
        max_products_on_page: page_size,
        results,
    })
}

pub(crate) fn parse_id_list(raw: Option<&str>, field: &str) -> Result<Option<Vec<i64>>, ShopError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else { return Ok(None) };
    raw.split(',')
        .map(|part| part.trim().parse::<i64>().map_err(|_| ShopError::Validation(format!("{field}: {part:?} is not an id"))))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
