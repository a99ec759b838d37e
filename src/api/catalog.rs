//! Brands, animals, categories and package options.

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use super::{cached, AppState};
use crate::db::catalog::{self, Animal, Brand};
use crate::domain::aggregates::ProductOption;
use crate::ShopError;

#[derive(Debug, Deserialize)]
pub struct BrandParams { pub animal: Option<i64>, pub category: Option<i64> }

#[derive(Debug, Deserialize)]
pub struct AnimalParam { pub animal: Option<i64> }

pub async fn list_brands(State(s): State<AppState>, Query(p): Query<BrandParams>, uri: Uri) -> Result<Response, ShopError> {
    cached(&s, "BRANDS_LIST", &uri, s.cache.ttl(), async {
        Ok((StatusCode::OK, catalog::list_brands(&s.db, p.animal, p.category).await?))
    })
    .await
}

pub async fn get_brand(State(s): State<AppState>, Path(id): Path<i64>) -> Result<Json<Brand>, ShopError> {
    catalog::get_brand(&s.db, id).await?.map(Json).ok_or(ShopError::NotFound("brand"))
}

pub async fn list_animals(State(s): State<AppState>) -> Result<Json<Vec<Animal>>, ShopError> {
    Ok(Json(catalog::list_animals(&s.db).await?))
}

pub async fn get_animal(State(s): State<AppState>, Path(id): Path<i64>) -> Result<Json<Animal>, ShopError> {
    catalog::get_animal(&s.db, id).await?.map(Json).ok_or(ShopError::NotFound("animal"))
}

pub async fn list_categories(State(s): State<AppState>, Query(p): Query<AnimalParam>, uri: Uri) -> Result<Response, ShopError> {
    cached(&s, "CATEGORY_LIST", &uri, s.cache.ttl(), async {
        Ok((StatusCode::OK, catalog::list_categories(&s.db, p.animal).await?))
    })
    .await
}

pub async fn list_options(State(s): State<AppState>) -> Result<Json<Vec<ProductOption>>, ShopError> {
    Ok(Json(catalog::list_options(&s.db).await?))
}

pub async fn get_option(State(s): State<AppState>, Path(id): Path<i64>) -> Result<Json<ProductOption>, ShopError> {
    catalog::get_option(&s.db, id).await?.map(Json).ok_or(ShopError::NotFound("option"))
}
