//! Orders repository

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::postgres::PgUnitOfWork;
use crate::{
    error::AppResult,
    models::order::{Order, OrderItem},
};

#[async_trait]
pub trait OrderStore: Send {
    async fn order_insert(&mut self, user_id: i32, total: Decimal) -> AppResult<Order>;
    async fn order_item_insert(
        &mut self,
        order_id: i32,
        book_id: i32,
        quantity: i32,
        price: Decimal,
    ) -> AppResult<OrderItem>;
    /// Orders of a user, newest first
    async fn orders_by_user(&mut self, user_id: i32) -> AppResult<Vec<Order>>;
    async fn order_items_by_order(&mut self, order_id: i32) -> AppResult<Vec<OrderItem>>;
}

#[async_trait]
impl OrderStore for PgUnitOfWork {
    async fn order_insert(&mut self, user_id: i32, total: Decimal) -> AppResult<Order> {
        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (user_id, total, created_at) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(total)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(order)
    }

    async fn order_item_insert(
        &mut self,
        order_id: i32,
        book_id: i32,
        quantity: i32,
        price: Decimal,
    ) -> AppResult<OrderItem> {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (order_id, book_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(book_id)
        .bind(quantity)
        .bind(price)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(item)
    }

    async fn orders_by_user(&mut self, user_id: i32) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, order_id DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn order_items_by_order(&mut self, order_id: i32) -> AppResult<Vec<OrderItem>> {
        let rows = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY order_item_id",
        )
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }
}
