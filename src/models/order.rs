//! Order and order line models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub order_id: i32,
    pub user_id: i32,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub order_item_id: i32,
    pub order_id: i32,
    pub book_id: i32,
    pub quantity: i32,
    /// Unit price at checkout time
    pub price: Decimal,
}

/// One requested line of a checkout
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckoutLine {
    pub book_id: i32,
    #[validate(range(min = 1, message = "The quantity must be at least 1"))]
    pub quantity: i32,
}

/// Checkout request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Checkout {
    pub user_id: i32,
    #[validate(length(min = 1, message = "The order has no items"), nested)]
    pub items: Vec<CheckoutLine>,
}

/// Order with its lines
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Sum of quantity × unit price over the given lines
pub fn order_total(items: &[(i32, Decimal)]) -> Decimal {
    items
        .iter()
        .map(|(quantity, price)| Decimal::from(*quantity) * *price)
        .sum()
}
