//! Process configuration read from the environment (and `.env`).

use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub port: u16,
    pub redis_url: Option<String>,
    pub nats_url: Option<String>,
    pub telegram: Option<TelegramConfig>,
    pub page_cache_ttl: Duration,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let max_connections = parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?;
        let port = parse_or(&get, "PORT", 8083)?;
        let ttl_secs: u64 = parse_or(&get, "PAGE_CACHE_TTL_SECS", 60)?;
        let telegram = match (non_empty(get("BOT_TOKEN")), non_empty(get("CHAT_ID"))) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            _ => None,
        };
        Ok(Self {
            database_url,
            max_connections,
            port,
            redis_url: non_empty(get("REDIS_URL")),
            nats_url: non_empty(get("NATS_URL")),
            telegram,
            page_cache_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty(get(key)) {
        Some(raw) => raw.parse().with_context(|| format!("{key} has invalid value {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/zoo")])).unwrap();
        assert_eq!(config.port, 8083);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.page_cache_ttl, Duration::from_secs(60));
        assert!(config.redis_url.is_none());
        assert!(config.telegram.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_telegram_needs_both_values() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("BOT_TOKEN", "t")])).unwrap();
        assert!(config.telegram.is_none());
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("BOT_TOKEN", "t"), ("CHAT_ID", "42")])).unwrap();
        assert_eq!(config.telegram.unwrap().chat_id, "42");
    }

    #[test]
    fn test_bad_port() {
        assert!(Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("PORT", "http")])).is_err());
    }
}
