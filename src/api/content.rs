//! Articles, comments and shop information.

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use super::{cached, AppState};
use super::orders::{validate_name, validate_phone};
use crate::db::content::{self, Article, NewComment};
use crate::domain::events::DomainEvent;
use crate::ShopError;

#[derive(Debug, Deserialize)]
pub struct ArticleParams { pub animals: Option<i64> }

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(custom = "validate_name")]
    pub name_author: String,
    #[validate(length(min = 1, max = 5000))]
    pub body_of_comment: String,
    #[validate(custom = "validate_phone")]
    pub phone_number: Option<String>,
    #[validate(custom = "validate_name")]
    pub name_animal: Option<String>,
}

pub async fn list_articles(State(s): State<AppState>, Query(p): Query<ArticleParams>, uri: Uri) -> Result<Response, ShopError> {
    cached(&s, "ARTICLE_LIST", &uri, s.cache.ttl(), async {
        Ok((StatusCode::OK, content::list_articles(&s.db, p.animals).await?))
    })
    .await
}

pub async fn get_article(State(s): State<AppState>, Path(id): Path<i64>) -> Result<Json<Article>, ShopError> {
    content::get_article(&s.db, id).await?.map(Json).ok_or(ShopError::NotFound("article"))
}

pub async fn list_comments(State(s): State<AppState>, uri: Uri) -> Result<Response, ShopError> {
    cached(&s, "COMMENTS_LIST", &uri, s.cache.ttl() * 2, async {
        Ok((StatusCode::OK, content::list_published_comments(&s.db).await?))
    })
    .await
}

pub async fn create_comment(State(s): State<AppState>, Json(r): Json<CreateCommentRequest>) -> Result<StatusCode, ShopError> {
    r.validate()?;
    let comment = NewComment {
        name_author: r.name_author.trim().to_string(),
        body_of_comment: r.body_of_comment,
        phone_number: r.phone_number.map(|p| p.trim().to_string()),
        name_animal: r.name_animal.map(|n| n.trim().to_string()),
    };
    let id = content::create_comment(&s.db, &comment).await?;
    tracing::info!(comment_id = id, "comment awaiting moderation");
    s.notifier.dispatch(vec![DomainEvent::CommentPosted { name_author: comment.name_author }]);
    Ok(StatusCode::CREATED)
}

pub async fn shop_info(State(s): State<AppState>, uri: Uri) -> Result<Response, ShopError> {
    cached(&s, "SHOP_INFO", &uri, s.cache.ttl() * 2, async {
        let info = content::get_shop_info(&s.db).await?.ok_or(ShopError::NotFound("shop info"))?;
        Ok((StatusCode::OK, info))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::send;
    use axum::body::Body;
    use axum::http::Request;

    #[test]
    fn test_comment_validation() {
        let ok = CreateCommentRequest {
            name_author: "Anna Ivanova".into(), body_of_comment: "Great shop".into(),
            phone_number: Some("+375291234567".into()), name_animal: None,
        };
        assert!(ok.validate().is_ok());
        let bad_phone = CreateCommentRequest { phone_number: Some("555".into()), ..ok };
        assert!(bad_phone.validate().is_err());
    }

    #[tokio::test]
    async fn test_invalid_comment_rejected_before_storage() {
        let body = serde_json::json!({"name_author": "x1", "body_of_comment": "hi"});
        let request = Request::post("/api/v1/comments")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, json) = send(request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].is_string());
    }
}
