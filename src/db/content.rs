//! Articles, comments, shop information and consultation requests.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    #[sqlx(rename = "animal_id")]
    pub animals: i64,
    pub description: String,
    pub image: Option<String>,
    pub time_read: String,
    pub date_added: NaiveDate,
    pub is_active: bool,
}

/// Published comment as shown to visitors. The phone number is never exposed.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub name_author: String,
    pub body_of_comment: String,
    pub name_animal: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub name_author: String,
    pub body_of_comment: String,
    pub phone_number: Option<String>,
    pub name_animal: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Consultation {
    pub customer_name: Option<String>,
    pub phone_number: String,
    pub date_added: DateTime<Utc>,
    pub date_update: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct InfoShopRow {
    id: i64,
    address: Option<String>,
    metro: Option<String>,
    time_weekdays: Option<String>,
    time_weekend: Option<String>,
    phone_number: Option<String>,
    social: Option<String>,
    maps: String,
    photo: Option<String>,
    title: Option<String>,
    main_info: Option<String>,
    personal_data_politics: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InfoShopMainPage {
    pub main_title: Option<String>,
    pub option_one: Option<String>,
    pub option_two: Option<String>,
    pub photo_main_page: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InfoShopBlock { pub id: i64, pub info_title: Option<String>, pub info_text: Option<String> }

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Banner { pub title: Option<String>, pub color: String, pub image: Option<String> }

#[derive(Debug, Clone, Serialize)]
pub struct ShopDescription { pub title: Option<String>, pub main_info: Option<String> }

#[derive(Debug, Clone, Serialize)]
pub struct InfoShop {
    pub info_main_page: Option<InfoShopMainPage>,
    pub address: Option<String>,
    pub metro: Option<String>,
    pub time_weekdays: Option<String>,
    pub time_weekend: Option<String>,
    pub phone_number: Option<String>,
    pub social: Option<String>,
    pub maps: String,
    pub photo: Option<String>,
    pub description_shop: ShopDescription,
    pub second_info: Vec<InfoShopBlock>,
    pub personal_data_politics: Option<String>,
    pub banners: Vec<Banner>,
}

const ARTICLE_COLUMNS: &str = "id, title, animal_id, description, image, time_read, date_added, is_active";

pub async fn list_articles(pool: &PgPool, animal: Option<i64>) -> Result<Vec<Article>, sqlx::Error> {
    let sql = format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles WHERE is_active AND ($1::BIGINT IS NULL OR animal_id = $1) \
         ORDER BY date_added DESC, id DESC"
    );
    sqlx::query_as::<_, Article>(&sql).bind(animal).fetch_all(pool).await
}

pub async fn get_article(pool: &PgPool, id: i64) -> Result<Option<Article>, sqlx::Error> {
    let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE is_active AND id = $1");
    sqlx::query_as::<_, Article>(&sql).bind(id).fetch_optional(pool).await
}

pub async fn list_published_comments(pool: &PgPool) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "SELECT id, name_author, body_of_comment, name_animal FROM comments \
         WHERE published ORDER BY date_added DESC, id DESC",
    )
    .fetch_all(pool)
    .await
}

/// Store a visitor comment. It stays hidden until staff publish it.
pub async fn create_comment(pool: &PgPool, c: &NewComment) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO comments (name_author, body_of_comment, phone_number, name_animal, date_added, published) \
         VALUES ($1, $2, $3, $4, NOW(), FALSE) RETURNING id",
    )
    .bind(&c.name_author)
    .bind(&c.body_of_comment)
    .bind(&c.phone_number)
    .bind(&c.name_animal)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Record a consultation request; a repeated phone number refreshes the
/// existing request.
pub async fn upsert_consultation(pool: &PgPool, customer_name: Option<&str>, phone_number: &str) -> Result<Consultation, sqlx::Error> {
    sqlx::query_as::<_, Consultation>(
        "INSERT INTO consultations (customer_name, phone_number, date_added, date_update) \
         VALUES ($1, $2, NOW(), NOW()) \
         ON CONFLICT (phone_number) DO UPDATE SET customer_name = EXCLUDED.customer_name, date_update = NOW() \
         RETURNING customer_name, phone_number, date_added, date_update",
    )
    .bind(customer_name)
    .bind(phone_number)
    .fetch_one(pool)
    .await
}

pub async fn get_shop_info(pool: &PgPool) -> Result<Option<InfoShop>, sqlx::Error> {
    let Some(shop) = sqlx::query_as::<_, InfoShopRow>(
        "SELECT id, address, metro, time_weekdays, time_weekend, phone_number, social, maps, photo, \
         title, main_info, personal_data_politics FROM info_shop ORDER BY id LIMIT 1",
    )
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let main_page = sqlx::query_as::<_, InfoShopMainPage>(
        "SELECT main_title, option_one, option_two, photo_main_page FROM info_shop_main_page WHERE info_shop_id = $1",
    )
    .bind(shop.id)
    .fetch_optional(pool)
    .await?;
    let blocks = sqlx::query_as::<_, InfoShopBlock>(
        "SELECT id, info_title, info_text FROM info_shop_blocks WHERE info_shop_id = $1 ORDER BY id",
    )
    .bind(shop.id)
    .fetch_all(pool)
    .await?;
    let banners = sqlx::query_as::<_, Banner>(
        "SELECT title, color, image FROM banners WHERE info_shop_id = $1 AND is_active ORDER BY id",
    )
    .bind(shop.id)
    .fetch_all(pool)
    .await?;

    Ok(Some(InfoShop {
        info_main_page: main_page,
        address: shop.address,
        metro: shop.metro,
        time_weekdays: shop.time_weekdays,
        time_weekend: shop.time_weekend,
        phone_number: shop.phone_number,
        social: shop.social,
        maps: shop.maps,
        photo: shop.photo,
        description_shop: ShopDescription { title: shop.title, main_info: shop.main_info },
        second_info: blocks,
        personal_data_politics: shop.personal_data_politics,
        banners,
    }))
}
