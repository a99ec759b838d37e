//! Catalog reads: animals, brands, categories, products and their options.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::discount_from_db;
use crate::domain::aggregates::{Product, ProductImage, ProductOption};
use crate::domain::value_objects::{ArticleNumber, DiscountPercent, Popularity};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Animal { pub id: i64, pub name: String, pub image: Option<String> }

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Brand { pub id: i64, pub name: String, pub image: Option<String> }

#[derive(Debug, Clone, Serialize)]
pub struct Category { pub id: i64, pub name: String, pub subcategory: Vec<SubCategory> }

#[derive(Debug, Clone, Serialize)]
pub struct SubCategory {
    pub id: i64,
    pub name: String,
    #[serde(rename = "discount_subcategory")]
    pub discount: Option<DiscountPercent>,
}

#[derive(Debug, FromRow)]
struct CategoryRow { id: i64, name: String }

#[derive(Debug, FromRow)]
struct SubCategoryRow { id: i64, name: String, category_id: i64, discount: Option<i32> }

#[derive(Debug, FromRow)]
pub(crate) struct OptionRow {
    pub id: i64,
    pub article_number: Option<String>,
    pub product_id: i64,
    pub partial: bool,
    pub price: Decimal,
    pub size: i32,
    pub stock_balance: Decimal,
    pub is_active: bool,
    pub units: Option<String>,
    pub discount: Option<i32>,
}

impl From<OptionRow> for ProductOption {
    fn from(r: OptionRow) -> Self {
        let article_number = r.article_number.and_then(|a| ArticleNumber::new(a).ok());
        let mut option = ProductOption {
            id: r.id, article_number, product_id: r.product_id, partial: r.partial, price: r.price,
            size: r.size, stock_balance: r.stock_balance, is_active: r.is_active, units: r.units,
            discount: discount_from_db(r.discount),
        };
        option.normalize();
        option
    }
}

/// Column list shared by every option query; expects aliases `o`, `u`, `d`.
pub(crate) const OPTION_COLUMNS: &str = "o.id, o.article_number, o.product_id, o.partial, o.price, o.size, \
     o.stock_balance, o.is_active, u.unit_name AS units, \
     CASE WHEN d.is_active THEN d.discount_amount END AS discount";

pub(crate) const OPTION_JOINS: &str = "LEFT JOIN units u ON u.id = o.unit_id \
     LEFT JOIN discounts_by_option d ON d.id = o.discount_by_option_id";

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    features: Option<String>,
    composition: Option<String>,
    additives: Option<String>,
    analysis: Option<String>,
    date_added: DateTime<Utc>,
    is_active: bool,
    brand_id: Option<i64>,
    popular: i32,
    animal_ids: Vec<i64>,
    category_ids: Vec<i64>,
    subcategory_ids: Vec<i64>,
    subcategory_discount: Option<i32>,
}

#[derive(Debug, FromRow)]
struct ImageRow { id: i64, product_id: i64, image: Option<String> }

/// Filters accepted by the product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub animal: Option<i64>,
    pub brands: Option<Vec<i64>>,
    pub category: Option<i64>,
    pub subcategories: Option<Vec<i64>>,
    pub search: Option<String>,
    pub ids: Option<Vec<i64>>,
}

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.description, p.features, p.composition, p.additives, \
     p.analysis, p.date_added, p.is_active, p.brand_id, p.popular, p.animal_ids, p.category_ids, \
     p.subcategory_ids, \
     (SELECT MAX(ds.discount_amount) FROM discounts_by_subcategory ds \
       WHERE ds.is_active AND ds.subcategory_id = ANY(p.subcategory_ids)) AS subcategory_discount \
     FROM products p";

/// Escape `ILIKE` wildcards so user text matches literally.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') { escaped.push('\\'); }
        escaped.push(c);
    }
    escaped
}

/// Active products matching `filter`, with active options and images attached.
pub async fn list_products(pool: &PgPool, filter: &ProductFilter) -> Result<Vec<Product>, sqlx::Error> {
    let sql = format!(
        "{PRODUCT_SELECT} WHERE p.is_active \
         AND ($1::BIGINT IS NULL OR p.animal_ids && ARRAY[$1::BIGINT]) \
         AND ($2::BIGINT[] IS NULL OR p.brand_id = ANY($2)) \
         AND ($3::BIGINT IS NULL OR p.category_ids && ARRAY[$3::BIGINT]) \
         AND ($4::BIGINT[] IS NULL OR p.subcategory_ids && $4) \
         AND ($5::TEXT IS NULL OR p.name ILIKE '%' || $5 || '%' ESCAPE '\\') \
         AND ($6::BIGINT[] IS NULL OR p.id = ANY($6)) \
         ORDER BY p.name"
    );
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(filter.animal)
        .bind(filter.brands.as_deref())
        .bind(filter.category)
        .bind(filter.subcategories.as_deref())
        .bind(filter.search.as_deref().map(escape_like))
        .bind(filter.ids.as_deref())
        .fetch_all(pool)
        .await?;
    attach_children(pool, rows).await
}

pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    let sql = format!("{PRODUCT_SELECT} WHERE p.is_active AND p.id = $1");
    let row = sqlx::query_as::<_, ProductRow>(&sql).bind(id).fetch_optional(pool).await?;
    match row {
        Some(row) => Ok(attach_children(pool, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

async fn attach_children(pool: &PgPool, rows: Vec<ProductRow>) -> Result<Vec<Product>, sqlx::Error> {
    if rows.is_empty() { return Ok(vec![]); }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    let sql = format!(
        "SELECT {OPTION_COLUMNS} FROM product_options o {OPTION_JOINS} \
         WHERE o.product_id = ANY($1) AND o.is_active ORDER BY o.partial, o.size, o.id"
    );
    let option_rows = sqlx::query_as::<_, OptionRow>(&sql).bind(&ids).fetch_all(pool).await?;
    let image_rows = sqlx::query_as::<_, ImageRow>(
        "SELECT id, product_id, image FROM product_images WHERE product_id = ANY($1) ORDER BY id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut options: HashMap<i64, Vec<ProductOption>> = HashMap::new();
    for row in option_rows {
        options.entry(row.product_id).or_default().push(row.into());
    }
    let mut images: HashMap<i64, Vec<ProductImage>> = HashMap::new();
    for row in image_rows {
        images.entry(row.product_id).or_default().push(ProductImage { id: row.id, image: row.image });
    }

    Ok(rows
        .into_iter()
        .map(|r| Product {
            id: r.id,
            name: r.name,
            description: r.description,
            features: r.features,
            composition: r.composition,
            additives: r.additives,
            analysis: r.analysis,
            date_added: r.date_added,
            is_active: r.is_active,
            brand_id: r.brand_id,
            popular: Popularity::try_from(r.popular).unwrap_or_default(),
            animal_ids: r.animal_ids,
            category_ids: r.category_ids,
            subcategory_ids: r.subcategory_ids,
            options: options.remove(&r.id).unwrap_or_default(),
            images: images.remove(&r.id).unwrap_or_default(),
            subcategory_discount: discount_from_db(r.subcategory_discount),
        })
        .collect())
}

pub async fn list_options(pool: &PgPool) -> Result<Vec<ProductOption>, sqlx::Error> {
    let sql = format!(
        "SELECT {OPTION_COLUMNS} FROM product_options o {OPTION_JOINS} \
         WHERE o.is_active ORDER BY o.partial, o.size, o.id"
    );
    let rows = sqlx::query_as::<_, OptionRow>(&sql).fetch_all(pool).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn get_option(pool: &PgPool, id: i64) -> Result<Option<ProductOption>, sqlx::Error> {
    let sql = format!("SELECT {OPTION_COLUMNS} FROM product_options o {OPTION_JOINS} WHERE o.is_active AND o.id = $1");
    let row = sqlx::query_as::<_, OptionRow>(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.map(Into::into))
}

pub async fn list_animals(pool: &PgPool) -> Result<Vec<Animal>, sqlx::Error> {
    sqlx::query_as::<_, Animal>("SELECT id, name, image FROM animals ORDER BY id").fetch_all(pool).await
}

pub async fn get_animal(pool: &PgPool, id: i64) -> Result<Option<Animal>, sqlx::Error> {
    sqlx::query_as::<_, Animal>("SELECT id, name, image FROM animals WHERE id = $1").bind(id).fetch_optional(pool).await
}

/// Brands that have products for `animal` (and `category`, which only narrows
/// an animal filter).
pub async fn list_brands(pool: &PgPool, animal: Option<i64>, category: Option<i64>) -> Result<Vec<Brand>, sqlx::Error> {
    let category = animal.and(category);
    sqlx::query_as::<_, Brand>(
        "SELECT b.id, b.name, b.image FROM brands b \
         WHERE $1::BIGINT IS NULL OR EXISTS ( \
             SELECT 1 FROM products p WHERE p.brand_id = b.id \
             AND p.animal_ids && ARRAY[$1::BIGINT] \
             AND ($2::BIGINT IS NULL OR p.category_ids && ARRAY[$2::BIGINT])) \
         ORDER BY b.id",
    )
    .bind(animal)
    .bind(category)
    .fetch_all(pool)
    .await
}

pub async fn get_brand(pool: &PgPool, id: i64) -> Result<Option<Brand>, sqlx::Error> {
    sqlx::query_as::<_, Brand>("SELECT id, name, image FROM brands WHERE id = $1").bind(id).fetch_optional(pool).await
}

/// Active categories with their active subcategories and subcategory discounts.
pub async fn list_categories(pool: &PgPool, animal: Option<i64>) -> Result<Vec<Category>, sqlx::Error> {
    let categories = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name FROM categories WHERE is_active AND ($1::BIGINT IS NULL OR animal_id = $1) ORDER BY id",
    )
    .bind(animal)
    .fetch_all(pool)
    .await?;
    let ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
    let subcategories = sqlx::query_as::<_, SubCategoryRow>(
        "SELECT s.id, s.name, s.category_id, \
         CASE WHEN d.is_active THEN d.discount_amount END AS discount \
         FROM subcategories s LEFT JOIN discounts_by_subcategory d ON d.subcategory_id = s.id \
         WHERE s.is_active AND s.category_id = ANY($1) ORDER BY s.id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<SubCategory>> = HashMap::new();
    for s in subcategories {
        grouped.entry(s.category_id).or_default().push(SubCategory {
            id: s.id, name: s.name, discount: discount_from_db(s.discount),
        });
    }
    Ok(categories
        .into_iter()
        .map(|c| Category { subcategory: grouped.remove(&c.id).unwrap_or_default(), id: c.id, name: c.name })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("корм"), "корм");
        assert_eq!(escape_like("100%_cat\\"), "100\\%\\_cat\\\\");
    }
}
