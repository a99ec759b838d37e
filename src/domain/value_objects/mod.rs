//! Value Objects for the storefront

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Article number printed on a package option
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArticleNumber(String);

impl ArticleNumber {
    pub fn new(value: impl Into<String>) -> Result<Self, ArticleNumberError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(ArticleNumberError::Empty); }
        if value.chars().count() > 200 { return Err(ArticleNumberError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ArticleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for ArticleNumber {
    type Error = ArticleNumberError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<ArticleNumber> for String {
    fn from(value: ArticleNumber) -> Self { value.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArticleNumberError {
    #[error("article number empty")]
    Empty,
    #[error("article number too long")]
    TooLong,
}

/// Discount percent, always within 1..=90
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DiscountPercent(u32);

impl DiscountPercent {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 90;

    pub fn new(value: u32) -> Result<Self, DiscountError> {
        if !(Self::MIN..=Self::MAX).contains(&value) { return Err(DiscountError::OutOfRange(value)); }
        Ok(Self(value))
    }
    pub fn value(&self) -> u32 { self.0 }
    /// Share of the price the customer still pays, in percent.
    pub fn complement(&self) -> u32 { 100 - self.0 }
}

impl TryFrom<u32> for DiscountPercent {
    type Error = DiscountError;
    fn try_from(value: u32) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<DiscountPercent> for u32 {
    fn from(value: DiscountPercent) -> Self { value.0 }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}%", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscountError {
    #[error("discount {0}% outside 1..=90")]
    OutOfRange(u32),
}

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\+375)?(?:33|44|25|29)?([0-9]{7})$").expect("phone pattern compiles")
});

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^([А-Яа-я][а-яё]{1,30}\s{0,3}[А-Яа-я][а-яё]{1,30}|",
        r"[A-Za-z][a-z]{1,30}\s{0,3}[A-Za-z][a-z]{1,30})$"
    ))
    .expect("name pattern compiles")
});

pub fn is_valid_phone(value: &str) -> bool { PHONE_RE.is_match(value) }
pub fn is_valid_name(value: &str) -> bool { NAME_RE.is_match(value) }

/// Belarusian phone number, with or without the country and operator prefix
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(value: &str) -> Result<Self, ContactError> {
        let value = value.trim();
        if !is_valid_phone(value) { return Err(ContactError::Phone); }
        Ok(Self(value.to_string()))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Customer or pet name as typed on the storefront
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName(String);

impl PersonName {
    pub fn parse(value: &str) -> Result<Self, ContactError> {
        let value = value.trim();
        if !is_valid_name(value) { return Err(ContactError::Name); }
        Ok(Self(value.to_string()))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("invalid phone number")]
    Phone,
    #[error("invalid name")]
    Name,
}

/// Merchandising weight shown as badges on the storefront
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Popularity {
    #[default]
    Standard,
    Popular,
    VeryPopular,
}

impl TryFrom<i32> for Popularity {
    type Error = String;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Standard),
            1 => Ok(Self::Popular),
            2 => Ok(Self::VeryPopular),
            other => Err(format!("unknown popularity {other}")),
        }
    }
}

impl From<Popularity> for i32 {
    fn from(value: Popularity) -> Self {
        match value { Popularity::Standard => 0, Popularity::Popular => 1, Popularity::VeryPopular => 2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_number() {
        let a = ArticleNumber::new("  RC-2KG ").unwrap();
        assert_eq!(a.as_str(), "RC-2KG");
        assert_eq!(ArticleNumber::new("   "), Err(ArticleNumberError::Empty));
    }

    #[test]
    fn test_discount_bounds() {
        assert!(DiscountPercent::new(0).is_err());
        assert!(DiscountPercent::new(91).is_err());
        assert_eq!(DiscountPercent::new(90).unwrap().complement(), 10);
        assert_eq!(DiscountPercent::new(1).unwrap().value(), 1);
    }

    #[test]
    fn test_discount_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<DiscountPercent>("15").is_ok());
        assert!(serde_json::from_str::<DiscountPercent>("95").is_err());
    }

    #[test]
    fn test_phone() {
        assert!(PhoneNumber::parse("+375291234567").is_ok());
        assert!(PhoneNumber::parse("291234567").is_ok());
        assert!(PhoneNumber::parse("1234567").is_ok());
        assert_eq!(PhoneNumber::parse("12345"), Err(ContactError::Phone));
        assert!(PhoneNumber::parse("+375991234567").is_err());
    }

    #[test]
    fn test_name() {
        assert!(PersonName::parse("Иван Петров").is_ok());
        assert!(PersonName::parse("John Smith").is_ok());
        assert!(PersonName::parse("Ivan").is_ok());
        assert!(PersonName::parse("Al").is_err());
        assert!(PersonName::parse("R2D2").is_err());
    }

    #[test]
    fn test_popularity_codes() {
        assert_eq!(Popularity::try_from(2), Ok(Popularity::VeryPopular));
        assert!(Popularity::try_from(3).is_err());
        assert_eq!(i32::from(Popularity::Popular), 1);
    }
}
