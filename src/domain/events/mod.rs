//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
    ConsultationRequested { customer_name: Option<String>, phone_number: String },
    CommentPosted { name_author: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed {
        reference: Uuid,
        customer_name: String,
        phone_number: String,
        total: Decimal,
        total_without_discount: Decimal,
        items: Vec<OrderedItem>,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderedItem {
    pub article_number: String,
    pub product_name: String,
    /// As ordered: grams when `partial`, pieces otherwise.
    pub quantity: Decimal,
    pub partial: bool,
    /// `quantity` in stock units (kilograms when `partial`).
    pub billable: Decimal,
    /// Stock before this order was taken from it.
    pub stock_balance: Decimal,
    pub price: Decimal,
}

impl DomainEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::Placed { .. }) => "zoo.events.order_placed",
            Self::ConsultationRequested { .. } => "zoo.events.consultation_requested",
            Self::CommentPosted { .. } => "zoo.events.comment_posted",
        }
    }

    /// Markdown message for the shop's staff chat.
    pub fn telegram_text(&self) -> String {
        match self {
            Self::Order(OrderEvent::Placed { customer_name, phone_number, total, total_without_discount, items, .. }) => {
                let mut text = format!(
                    "📍Новый Заказ\n{customer_name} {phone_number}\n💴На сумму: {total},\n❗️скидка: {}\n",
                    total_without_discount - total
                );
                for item in items {
                    let warning = if item.billable >= item.stock_balance { "⚠️" } else { "" };
                    let (quantity_unit, stock_unit) = if item.partial { (" г", " кг") } else { ("", "") };
                    text.push_str(&format!(
                        "🐤 Товар: {}\n— Артикул:{},\n— Кол-во: {}{quantity_unit},\n— Остаток на складе: {}{stock_unit}{warning},\n— Цена: **{}**\n",
                        item.product_name, item.article_number, item.quantity, item.stock_balance, item.price
                    ));
                }
                text
            }
            Self::ConsultationRequested { customer_name, phone_number } => format!(
                "📞Новая заявка на консультацию!!!\n{}, {phone_number}",
                customer_name.as_deref().unwrap_or("—")
            ),
            Self::CommentPosted { .. } => {
                "💬Добавлен новый комментарий,\nпросмотреть можно в административной панеле сайта".to_string()
            }
        }
    }
}
