//! Product listing, detail and accompanying goods.

use std::cmp::Ordering;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{cached, paginate, parse_id_list, AppState};
use crate::db::catalog::{self, Brand, ProductFilter};
use crate::domain::aggregates::{Product, ProductImage, ProductOption};
use crate::domain::value_objects::{DiscountPercent, Popularity};
use crate::recommendations::DEFAULT_SUGGESTIONS;
use crate::ShopError;

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub animal: Option<i64>,
    pub brand: Option<String>,
    pub category: Option<i64>,
    pub subcategory: Option<String>,
    pub on_discount: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// Catalog card: the product with its price annotations.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    pub id: i64,
    pub name: String,
    pub popular: Popularity,
    pub date_added: DateTime<Utc>,
    pub greatest_discount: Option<DiscountPercent>,
    pub discount_by_subcategory: Option<DiscountPercent>,
    pub min_price: Option<Decimal>,
    pub chosen_option: Option<ProductOption>,
    pub options: Vec<ProductOption>,
    pub images: Vec<ProductImage>,
}

impl From<Product> for ProductCard {
    fn from(p: Product) -> Self {
        let pricing = p.card_pricing();
        let chosen_option = pricing.chosen_option_id.and_then(|id| p.option_by_id(id)).cloned();
        Self {
            id: p.id,
            name: p.name,
            popular: p.popular,
            date_added: p.date_added,
            greatest_discount: pricing.greatest_discount,
            discount_by_subcategory: pricing.discount_by_subcategory,
            min_price: pricing.min_price,
            chosen_option,
            options: p.options,
            images: p.images,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub card: ProductCard,
    pub brand: Option<Brand>,
    pub description: Option<String>,
    pub features: Option<String>,
    pub composition: Option<String>,
    pub additives: Option<String>,
    pub analysis: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey { Name, Popular, DateAdded, MinPrice }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort { pub key: SortKey, pub descending: bool }

impl Default for Sort {
    fn default() -> Self { Self { key: SortKey::Name, descending: false } }
}

impl Sort {
    /// Parse `name`, `-popular`, ... Unknown fields fall back to name order.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else { return Self::default() };
        let (descending, field) = match raw.strip_prefix('-') { Some(f) => (true, f), None => (false, raw) };
        let key = match field {
            "name" => SortKey::Name,
            "popular" => SortKey::Popular,
            "date_added" => SortKey::DateAdded,
            "min_price" => SortKey::MinPrice,
            _ => return Self::default(),
        };
        Self { key, descending }
    }

    pub fn apply(&self, cards: &mut [ProductCard]) {
        cards.sort_by(|a, b| {
            let ord = match self.key {
                SortKey::Name => a.name.cmp(&b.name),
                SortKey::Popular => a.popular.cmp(&b.popular),
                SortKey::DateAdded => a.date_added.cmp(&b.date_added),
                SortKey::MinPrice => cmp_price(a.min_price, b.min_price),
            };
            let ord = if self.descending { ord.reverse() } else { ord };
            ord.then_with(|| a.id.cmp(&b.id))
        });
    }
}

/// Cards without a price sort after every priced card.
fn cmp_price(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn truthy(raw: Option<&str>) -> bool {
    matches!(raw.map(str::trim), Some(v) if !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
}

pub fn filter_from_params(p: &ProductListParams) -> Result<ProductFilter, ShopError> {
    Ok(ProductFilter {
        animal: p.animal,
        brands: parse_id_list(p.brand.as_deref(), "brand")?,
        category: p.category,
        subcategories: parse_id_list(p.subcategory.as_deref(), "subcategory")?,
        search: p.search.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
        ids: None,
    })
}

pub async fn list_products(
    State(s): State<AppState>,
    Query(p): Query<ProductListParams>,
    uri: Uri,
) -> Result<Response, ShopError> {
    cached(&s, "PRODUCTS_LIST", &uri, s.cache.ttl(), async {
        let filter = filter_from_params(&p)?;
        let products = catalog::list_products(&s.db, &filter).await?;
        let mut cards: Vec<ProductCard> = products.into_iter().map(ProductCard::from).collect();
        if truthy(p.on_discount.as_deref()) {
            cards.retain(|c| c.greatest_discount.is_some());
        }
        Sort::parse(p.ordering.as_deref()).apply(&mut cards);
        let page = paginate(cards, p.page, p.page_size)?;
        let status = if page.results.is_empty() { StatusCode::BAD_REQUEST } else { StatusCode::OK };
        Ok((status, page))
    })
    .await
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<i64>) -> Result<Json<ProductDetail>, ShopError> {
    let product = catalog::get_product(&s.db, id).await?.ok_or(ShopError::NotFound("product"))?;
    let brand = match product.brand_id {
        Some(brand_id) => catalog::get_brand(&s.db, brand_id).await?,
        None => None,
    };
    let description = product.description.clone();
    let features = product.features.clone();
    let composition = product.composition.clone();
    let additives = product.additives.clone();
    let analysis = product.analysis.clone();
    Ok(Json(ProductDetail {
        card: product.into(),
        brand,
        description,
        features,
        composition,
        additives,
        analysis,
    }))
}

/// Products most often bought together with `id`, best match first.
pub async fn accompanying_goods(State(s): State<AppState>, Path(id): Path<i64>) -> Result<Json<Vec<ProductCard>>, ShopError> {
    let ids = match s.recommender.suggest_products_for(id, DEFAULT_SUGGESTIONS).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(error = %e, product_id = id, "recommendations unavailable");
            vec![]
        }
    };
    if ids.is_empty() { return Ok(Json(vec![])); }

    let filter = ProductFilter { ids: Some(ids.clone()), ..Default::default() };
    let mut cards: Vec<ProductCard> = catalog::list_products(&s.db, &filter).await?.into_iter().map(ProductCard::from).collect();
    cards.sort_by_key(|c| ids.iter().position(|i| *i == c.id).unwrap_or(usize::MAX));
    Ok(Json(cards))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::{option, product};

    fn card(id: i64, name: &str, price: Option<i64>, popular: Popularity) -> ProductCard {
        ProductCard {
            id, name: name.into(), popular, date_added: Utc::now(), greatest_discount: None,
            discount_by_subcategory: None, min_price: price.map(|p| Decimal::new(p, 2)),
            chosen_option: None, options: vec![], images: vec![],
        }
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(Sort::parse(Some("-min_price")), Sort { key: SortKey::MinPrice, descending: true });
        assert_eq!(Sort::parse(Some("popular")), Sort { key: SortKey::Popular, descending: false });
        assert_eq!(Sort::parse(Some("price; drop table")), Sort::default());
        assert_eq!(Sort::parse(None), Sort::default());
    }

    #[test]
    fn test_sort_by_min_price_puts_unpriced_last() {
        let mut cards = vec![card(1, "b", None, Popularity::Standard), card(2, "a", Some(500), Popularity::Standard), card(3, "c", Some(100), Popularity::Standard)];
        Sort::parse(Some("min_price")).apply(&mut cards);
        let ids: Vec<i64> = cards.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_by_popularity_descending() {
        let mut cards = vec![card(1, "a", None, Popularity::Standard), card(2, "b", None, Popularity::VeryPopular), card(3, "c", None, Popularity::Popular)];
        Sort::parse(Some("-popular")).apply(&mut cards);
        let ids: Vec<i64> = cards.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_card_from_product_picks_discounted_option() {
        let mut discounted = option(2, 1, 3000, 5);
        discounted.discount = Some(DiscountPercent::new(10).unwrap());
        discounted.size = 5;
        let p = product(1, vec![option(1, 1, 1000, 5), discounted]);
        let card = ProductCard::from(p);
        assert_eq!(card.chosen_option.map(|o| o.id), Some(2));
        assert_eq!(card.greatest_discount.map(|d| d.value()), Some(10));
        assert_eq!(card.min_price, Some(Decimal::new(900, 2)));
    }

    #[test]
    fn test_truthy() {
        assert!(truthy(Some("1")));
        assert!(truthy(Some("true")));
        assert!(!truthy(Some("")));
        assert!(!truthy(Some("false")));
        assert!(!truthy(None));
    }

    #[test]
    fn test_filter_rejects_bad_brand_list() {
        let params = ProductListParams { brand: Some("1,two".into()), ..Default::default() };
        assert!(matches!(filter_from_params(&params), Err(ShopError::Validation(_))));
    }
}
