//! Checkout, consultation requests and today's discounts.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::AppState;
use crate::db::discounts::{self, DayDiscountView};
use crate::db::orders::{self, Checkout};
use crate::domain::aggregates::{Customer, PlacedOrder};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{is_valid_name, is_valid_phone, ArticleNumber, PersonName, PhoneNumber};
use crate::ShopError;

pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if is_valid_phone(value.trim()) { Ok(()) } else { Err(ValidationError::new("phone_number")) }
}

pub fn validate_name(value: &str) -> Result<(), ValidationError> {
    if is_valid_name(value.trim()) { Ok(()) } else { Err(ValidationError::new("name")) }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(custom = "validate_phone")]
    pub phone_number: String,
    #[validate(custom = "validate_name")]
    pub customer_name: String,
    #[validate(length(min = 1, max = 100))]
    pub items: Vec<OrderItemRequest>,
    /// Total the storefront displayed; checked against the server's pricing.
    pub expected_total: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub article_number: String,
    /// Grams for sold-by-weight options, pieces otherwise.
    #[validate(range(min = 1))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CallBackRequest {
    #[validate(custom = "validate_phone")]
    pub phone_number: String,
    #[validate(custom = "validate_name")]
    pub customer_name: Option<String>,
}

impl CreateOrderRequest {
    fn into_checkout(self, weekday: u32) -> Result<Checkout, ShopError> {
        self.validate()?;
        for item in &self.items { item.validate()?; }
        let customer = Customer {
            phone_number: PhoneNumber::parse(&self.phone_number).map_err(|e| ShopError::Validation(e.to_string()))?,
            customer_name: PersonName::parse(&self.customer_name).map_err(|e| ShopError::Validation(e.to_string()))?,
        };
        let items = self
            .items
            .into_iter()
            .map(|i| {
                ArticleNumber::new(i.article_number)
                    .map(|a| (a, i.quantity))
                    .map_err(|e| ShopError::Validation(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Checkout { customer, items, expected_total: self.expected_total, weekday })
    }
}

fn today() -> u32 { Local::now().weekday().num_days_from_monday() }

pub async fn create_order(State(s): State<AppState>, Json(r): Json<CreateOrderRequest>) -> Result<(StatusCode, Json<PlacedOrder>), ShopError> {
    let checkout = r.into_checkout(today())?;
    let placement = orders::place_order(&s.db, checkout).await?;
    if let Err(e) = s.recommender.products_bought(&placement.product_ids).await {
        tracing::warn!(error = %e, order_id = placement.order.id, "co-purchase update failed");
    }
    s.notifier.dispatch(placement.events);
    Ok((StatusCode::CREATED, Json(placement.order)))
}

pub async fn call_back(State(s): State<AppState>, Json(r): Json<CallBackRequest>) -> Result<StatusCode, ShopError> {
    r.validate()?;
    let name = r.customer_name.as_deref().map(str::trim);
    let phone = r.phone_number.trim();
    let consultation = crate::db::content::upsert_consultation(&s.db, name, phone).await?;
    tracing::info!(phone = %consultation.phone_number, "consultation requested");
    s.notifier.dispatch(vec![DomainEvent::ConsultationRequested {
        customer_name: consultation.customer_name,
        phone_number: consultation.phone_number,
    }]);
    Ok(StatusCode::CREATED)
}

pub async fn list_discounts(State(s): State<AppState>) -> Result<Json<Vec<DayDiscountView>>, ShopError> {
    let discounts = discounts::active_for_weekday(&s.db, today()).await?;
    Ok(Json(discounts.iter().map(DayDiscountView::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::send;
    use axum::body::Body;
    use axum::http::Request;

    fn request(phone: &str, items: serde_json::Value) -> CreateOrderRequest {
        serde_json::from_value(serde_json::json!({
            "phone_number": phone,
            "customer_name": "Anna Ivanova",
            "items": items,
            "expected_total": "25.00",
        }))
        .unwrap()
    }

    #[test]
    fn test_into_checkout() {
        let checkout = request("+375291234567", serde_json::json!([{"article_number": " A-1 ", "quantity": 2}]))
            .into_checkout(4)
            .unwrap();
        assert_eq!(checkout.items[0].0.as_str(), "A-1");
        assert_eq!(checkout.expected_total, Some(Decimal::new(2500, 2)));
        assert_eq!(checkout.weekday, 4);
    }

    #[test]
    fn test_checkout_rejects_zero_quantity_and_empty_basket() {
        let zero = request("+375291234567", serde_json::json!([{"article_number": "A-1", "quantity": 0}]));
        assert!(matches!(zero.into_checkout(0), Err(ShopError::Validation(_))));
        let empty = request("+375291234567", serde_json::json!([]));
        assert!(matches!(empty.into_checkout(0), Err(ShopError::Validation(_))));
    }

    #[test]
    fn test_checkout_rejects_oversized_basket() {
        let items: Vec<_> = (0..101).map(|i| serde_json::json!({"article_number": format!("A-{i}"), "quantity": 1})).collect();
        let oversized = request("+375291234567", serde_json::Value::Array(items));
        assert!(oversized.validate().is_err());
        assert!(matches!(oversized.into_checkout(0), Err(ShopError::Validation(_))));
    }

    #[tokio::test]
    async fn test_order_with_bad_phone_rejected_before_storage() {
        let body = serde_json::json!({
            "phone_number": "12",
            "customer_name": "Anna Ivanova",
            "items": [{"article_number": "A-1", "quantity": 1}],
        });
        let request = Request::post("/api/v1/order")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_call_back_with_bad_name_rejected() {
        let body = serde_json::json!({"phone_number": "+375291234567", "customer_name": "7"});
        let request = Request::post("/api/v1/order/call_back")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
