//! Co-purchase recommendations.
//!
//! Every order bumps, for each product in it, the score of every other
//! product bought alongside. Scores live in one Redis sorted set per product.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

pub const DEFAULT_SUGGESTIONS: usize = 12;

pub fn purchased_with_key(product_id: i64) -> String {
    format!("product:{product_id}:purchased_with")
}

/// Ordered pairs `(product, bought_with)` an order contributes. Duplicate ids
/// count once and a product is never paired with itself.
pub fn co_purchase_pairs(product_ids: &[i64]) -> Vec<(i64, i64)> {
    let mut distinct: Vec<i64> = Vec::with_capacity(product_ids.len());
    for id in product_ids {
        if !distinct.contains(id) { distinct.push(*id); }
    }
    let mut pairs = Vec::with_capacity(distinct.len() * distinct.len().saturating_sub(1));
    for a in &distinct {
        for b in &distinct {
            if a != b { pairs.push((*a, *b)); }
        }
    }
    pairs
}

#[derive(Clone)]
pub struct Recommender {
    conn: Option<ConnectionManager>,
}

impl Recommender {
    pub fn new(conn: Option<ConnectionManager>) -> Self { Self { conn } }

    pub fn disabled() -> Self { Self { conn: None } }

    pub async fn products_bought(&self, product_ids: &[i64]) -> Result<(), redis::RedisError> {
        let Some(conn) = &self.conn else { return Ok(()) };
        let pairs = co_purchase_pairs(product_ids);
        if pairs.is_empty() { return Ok(()); }

        let mut pipe = redis::pipe();
        for (product, with) in &pairs {
            pipe.zincr(purchased_with_key(*product), *with, 1).ignore();
        }
        let mut conn = conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        tracing::debug!(pairs = pairs.len(), "co-purchase counters updated");
        Ok(())
    }

    /// Product ids most often bought with `product_id`, best first.
    pub async fn suggest_products_for(&self, product_id: i64, max_results: usize) -> Result<Vec<i64>, redis::RedisError> {
        let Some(conn) = &self.conn else { return Ok(vec![]) };
        if max_results == 0 { return Ok(vec![]); }
        let mut conn = conn.clone();
        let stop = isize::try_from(max_results).unwrap_or(isize::MAX) - 1;
        conn.zrevrange(purchased_with_key(product_id), 0, stop).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key() {
        assert_eq!(purchased_with_key(42), "product:42:purchased_with");
    }

    #[test]
    fn test_pairs_skip_self_and_duplicates() {
        let pairs = co_purchase_pairs(&[1, 2, 1, 3]);
        assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 1), (2, 3), (3, 1), (3, 2)]);
    }

    #[test]
    fn test_single_product_has_no_pairs() {
        assert!(co_purchase_pairs(&[7, 7]).is_empty());
        assert!(co_purchase_pairs(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_disabled_recommender_is_silent() {
        let r = Recommender::disabled();
        r.products_bought(&[1, 2]).await.unwrap();
        assert!(r.suggest_products_for(1, DEFAULT_SUGGESTIONS).await.unwrap().is_empty());
    }
}
