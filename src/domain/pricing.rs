//! Discount resolution and basket pricing.
//!
//! Every price the storefront shows and every total an order is charged goes
//! through this module, so a card advertised at a price is billed at that
//! price. Three discount sources exist:
//!
//! - a discount attached to a single package option,
//! - a discount attached to a subcategory (applies to all of its products),
//! - a day-of-week discount whose tier depends on the basket total.
//!
//! The first two compete per line and the greatest wins. The day discount
//! applies only to the part of the basket that carries no other discount.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::DiscountPercent;

/// Grams in one priced unit of a sold-by-weight option.
pub const GRAMS_PER_PRICED_UNIT: i64 = 1000;

/// Round a money amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Greatest of the present discounts.
pub fn resolve_discount<I>(sources: I) -> Option<DiscountPercent>
where
    I: IntoIterator<Item = Option<DiscountPercent>>,
{
    sources.into_iter().flatten().max()
}

/// Unit price after `discount`, rounded to cents.
pub fn discounted_price(price: Decimal, discount: Option<DiscountPercent>) -> Decimal {
    match discount {
        Some(d) => round_money(price * Decimal::from(d.complement()) / Decimal::ONE_HUNDRED),
        None => price,
    }
}

/// Quantity the price is multiplied by. Sold-by-weight options are ordered in
/// grams and priced per kilogram.
pub fn billable_quantity(quantity: Decimal, partial: bool) -> Decimal {
    if partial {
        quantity / Decimal::from(GRAMS_PER_PRICED_UNIT)
    } else {
        quantity
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayDiscountTier {
    pub min_total: Decimal,
    pub discount: DiscountPercent,
}

/// Order-total discount active on certain weekdays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayDiscount {
    pub title: Option<String>,
    tiers: Vec<DayDiscountTier>,
}

impl DayDiscount {
    pub fn new(title: Option<String>, mut tiers: Vec<DayDiscountTier>) -> Self {
        tiers.sort_by(|a, b| b.min_total.cmp(&a.min_total));
        Self { title, tiers }
    }

    /// Tiers, highest threshold first.
    pub fn tiers(&self) -> &[DayDiscountTier] { &self.tiers }

    pub fn tier_for(&self, total: Decimal) -> Option<&DayDiscountTier> {
        self.tiers.iter().find(|t| total >= t.min_total)
    }

    pub fn apply(&self, total: Decimal) -> Decimal {
        match self.tier_for(total) {
            Some(tier) => discounted_price(total, Some(tier.discount)),
            None => total,
        }
    }
}

/// One priced line of a basket.
#[derive(Clone, Debug, PartialEq)]
pub struct BasketLine {
    pub price: Decimal,
    pub quantity: Decimal,
    pub partial: bool,
    pub option_discount: Option<DiscountPercent>,
    pub product_discount: Option<DiscountPercent>,
}

impl BasketLine {
    pub fn discount(&self) -> Option<DiscountPercent> {
        resolve_discount([self.option_discount, self.product_discount])
    }

    pub fn billable(&self) -> Decimal { billable_quantity(self.quantity, self.partial) }

    pub fn unit_price(&self) -> Decimal { discounted_price(self.price, self.discount()) }

    pub fn list_total(&self) -> Decimal { self.price * self.billable() }

    pub fn total(&self) -> Decimal { self.unit_price() * self.billable() }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BasketTotals {
    /// Lines with a per-option or per-subcategory discount, already discounted.
    pub discounted: Decimal,
    /// Lines without such a discount, before the day discount.
    pub undiscounted: Decimal,
    pub day_discount: Option<DiscountPercent>,
    pub total: Decimal,
    pub total_without_discount: Decimal,
}

impl BasketTotals {
    pub fn saved(&self) -> Decimal { self.total_without_discount - self.total }
}

pub fn price_basket(lines: &[BasketLine], day: Option<&DayDiscount>) -> BasketTotals {
    let mut discounted = Decimal::ZERO;
    let mut undiscounted = Decimal::ZERO;
    let mut list = Decimal::ZERO;
    for line in lines {
        list += line.list_total();
        if line.discount().is_some() {
            discounted += line.total();
        } else {
            undiscounted += line.list_total();
        }
    }

    let tier = day
        .filter(|_| undiscounted > Decimal::ZERO)
        .and_then(|d| d.tier_for(undiscounted))
        .map(|t| t.discount);
    let undiscounted_after_day = discounted_price(undiscounted, tier);

    BasketTotals {
        discounted,
        undiscounted,
        day_discount: tier,
        total: round_money(undiscounted_after_day + discounted),
        total_without_discount: round_money(list),
    }
}

/// Option fields the card annotation looks at.
#[derive(Clone, Debug, PartialEq)]
pub struct PricedOption {
    pub id: i64,
    pub price: Decimal,
    pub partial: bool,
    pub size: i32,
    pub is_active: bool,
    pub discount: Option<DiscountPercent>,
}

/// Price annotations shown on a catalog card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CardPricing {
    pub base_price: Option<Decimal>,
    pub first_option_discount: Option<DiscountPercent>,
    pub discount_by_subcategory: Option<DiscountPercent>,
    pub greatest_discount: Option<DiscountPercent>,
    pub min_price: Option<Decimal>,
    pub chosen_option_id: Option<i64>,
}

impl CardPricing {
    pub fn for_product(options: &[PricedOption], subcategory_discount: Option<DiscountPercent>) -> Self {
        let mut active: Vec<&PricedOption> = options.iter().filter(|o| o.is_active).collect();
        active.sort_by_key(|o| (o.partial, o.size));

        let base_price = active.first().map(|o| o.price);
        let discounted_option = active.iter().find(|o| o.discount.is_some());
        let first_option_discount = discounted_option.and_then(|o| o.discount);
        let greatest_discount = resolve_discount([subcategory_discount, first_option_discount]);
        let chosen_option_id = discounted_option.or(active.first()).map(|o| o.id);

        Self {
            base_price,
            first_option_discount,
            discount_by_subcategory: subcategory_discount,
            greatest_discount,
            min_price: base_price.map(|p| discounted_price(p, greatest_discount)),
            chosen_option_id,
        }
    }

    pub fn on_discount(&self) -> bool { self.greatest_discount.is_some() }
}
