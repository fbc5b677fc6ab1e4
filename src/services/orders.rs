//! Orders service: checkout and order history

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::order::{order_total, Checkout, OrderDetail},
    repository::Repository,
};

#[derive(Clone)]
pub struct OrdersService {
    repository: Arc<dyn Repository>,
}

impl OrdersService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Place an order. Stock of every line is checked and decremented in
    /// the same unit of work that writes the order.
    pub async fn checkout(&self, request: Checkout) -> AppResult<OrderDetail> {
        let mut uow = self.repository.begin().await?;

        let mut lines = Vec::with_capacity(request.items.len());
        for line in &request.items {
            if line.quantity < 1 {
                return Err(AppError::Validation(
                    "The quantity must be at least 1".to_string(),
                ));
            }
            let book = uow
                .book_by_id(line.book_id)
                .await?
                .filter(|book| !book.deleted)
                .ok_or_else(|| AppError::NotFound(format!("Book {} not found", line.book_id)))?;
            // Conditional decrement: concurrent checkouts cannot oversell
            if uow.book_take_stock(book.book_id, line.quantity).await?.is_none() {
                tracing::warn!(
                    "Checkout rejected: book {} cannot cover {} units",
                    book.book_id,
                    line.quantity
                );
                return Err(AppError::Conflict(format!(
                    "Not enough stock for {}",
                    book.title
                )));
            }
            lines.push((book.book_id, line.quantity, book.price));
        }

        let pricing: Vec<_> = lines.iter().map(|(_, qty, price)| (*qty, *price)).collect();
        let order = uow.order_insert(request.user_id, order_total(&pricing)).await?;

        let mut items = Vec::with_capacity(lines.len());
        for (book_id, quantity, price) in lines {
            items.push(
                uow.order_item_insert(order.order_id, book_id, quantity, price)
                    .await?,
            );
        }
        uow.commit().await?;

        tracing::info!(
            "Order {} placed by user {}: {} items, total {}",
            order.order_id,
            order.user_id,
            items.len(),
            order.total
        );
        Ok(OrderDetail { order, items })
    }

    /// Orders of a user with their lines, newest first
    pub async fn orders_for_user(&self, user_id: i32) -> AppResult<Vec<OrderDetail>> {
        let mut uow = self.repository.begin().await?;
        let orders = uow.orders_by_user(user_id).await?;

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            let items = uow.order_items_by_order(order.order_id).await?;
            details.push(OrderDetail { order, items });
        }
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        models::order::CheckoutLine, repository::MemoryRepository,
        services::test_support::book_fields,
    };

    async fn setup() -> (MemoryRepository, OrdersService, i32, i32) {
        let repo = MemoryRepository::new();
        let mut uow = repo.begin().await.unwrap();
        let mut fields = book_fields("Eva Luna", "Sudamericana");
        fields.stock = 3;
        fields.price = Decimal::new(12500, 0);
        let first = uow.book_insert(&fields).await.unwrap();
        let mut fields = book_fields("Paula", "Sudamericana");
        fields.stock = 1;
        fields.price = Decimal::new(995, 1);
        let second = uow.book_insert(&fields).await.unwrap();
        uow.commit().await.unwrap();
        (
            repo.clone(),
            OrdersService::new(Arc::new(repo)),
            first.book_id,
            second.book_id,
        )
    }

    fn checkout(lines: &[(i32, i32)]) -> Checkout {
        Checkout {
            user_id: 4,
            items: lines
                .iter()
                .map(|&(book_id, quantity)| CheckoutLine { book_id, quantity })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_checkout_decrements_stock() {
        let (repo, service, first, second) = setup().await;
        let detail = service
            .checkout(checkout(&[(first, 2), (second, 1)]))
            .await
            .unwrap();

        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.order.total, Decimal::new(250995, 1));
        assert_eq!(detail.items[0].price, Decimal::new(12500, 0));

        let state = repo.snapshot().await;
        assert_eq!(state.books[0].stock, 1);
        assert_eq!(state.books[1].stock, 0);
        assert_eq!(state.orders.len(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_stock_unchanged() {
        let (repo, service, first, second) = setup().await;
        let result = service.checkout(checkout(&[(first, 1), (second, 2)])).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let state = repo.snapshot().await;
        assert_eq!(state.books[0].stock, 3);
        assert_eq!(state.books[1].stock, 1);
        assert!(state.orders.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_never_oversell() {
        let (repo, service, first, _) = setup().await;
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.checkout(checkout(&[(first, 1)])).await })
            })
            .collect();

        let mut placed = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => placed += 1,
                Err(e) => assert!(matches!(e, AppError::Conflict(_))),
            }
        }
        assert_eq!(placed, 3);
        assert_eq!(repo.snapshot().await.books[0].stock, 0);
    }

    #[tokio::test]
    async fn test_unknown_book_is_rejected() {
        let (_, service, _, _) = setup().await;
        assert!(matches!(
            service.checkout(checkout(&[(99, 1)])).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.checkout(checkout(&[(1, 0)])).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_orders_for_user_newest_first() {
        let (_, service, first, second) = setup().await;
        service.checkout(checkout(&[(first, 1)])).await.unwrap();
        service.checkout(checkout(&[(second, 1)])).await.unwrap();

        let orders = service.orders_for_user(4).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].items[0].book_id, second);
        assert!(service.orders_for_user(5).await.unwrap().is_empty());
    }
}
