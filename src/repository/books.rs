//! Books repository

use async_trait::async_trait;

use super::postgres::PgUnitOfWork;
use crate::{
    error::AppResult,
    models::book::{Book, BookFields, BookSales},
};

#[async_trait]
pub trait BookStore: Send {
    /// Lookup by id. Soft-deleted books are returned too.
    async fn book_by_id(&mut self, book_id: i32) -> AppResult<Option<Book>>;
    async fn book_by_title(&mut self, title: &str) -> AppResult<Option<Book>>;
    async fn book_insert(&mut self, fields: &BookFields) -> AppResult<Book>;
    async fn book_update(&mut self, book_id: i32, fields: &BookFields) -> AppResult<Option<Book>>;
    async fn book_mark_deleted(&mut self, book_id: i32) -> AppResult<Option<Book>>;
    /// Decrement the stock of an active book by `quantity`. Returns `None`
    /// when the book is missing, deleted or holds less than `quantity`.
    async fn book_take_stock(&mut self, book_id: i32, quantity: i32) -> AppResult<Option<Book>>;
    async fn books_all(&mut self) -> AppResult<Vec<Book>>;
    async fn books_active(&mut self) -> AppResult<Vec<Book>>;
    async fn books_by_publisher(&mut self, publisher: &str) -> AppResult<Vec<Book>>;
    /// Active books, most recent publication first
    async fn books_newest(&mut self, limit: usize) -> AppResult<Vec<Book>>;
    /// Active books with at least one sale, largest quantity sold first
    async fn books_best_selling(&mut self, limit: usize) -> AppResult<Vec<BookSales>>;
    /// Distinct publishers of active books, sorted
    async fn publishers(&mut self) -> AppResult<Vec<String>>;
}

#[async_trait]
impl BookStore for PgUnitOfWork {
    async fn book_by_id(&mut self, book_id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE book_id = $1")
            .bind(book_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(book)
    }

    async fn book_by_title(&mut self, title: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE LOWER(title) = LOWER($1) ORDER BY book_id LIMIT 1",
        )
        .bind(title)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(book)
    }

    async fn book_insert(&mut self, fields: &BookFields) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (isbn, img, title, description, language, pages,
                               publisher, pub_date, price, stock, deleted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE)
            RETURNING *
            "#,
        )
        .bind(&fields.isbn)
        .bind(&fields.img)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.language)
        .bind(fields.pages)
        .bind(&fields.publisher)
        .bind(fields.pub_date)
        .bind(fields.price)
        .bind(fields.stock)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(book)
    }

    async fn book_update(&mut self, book_id: i32, fields: &BookFields) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                isbn = $2, img = $3, title = $4, description = $5, language = $6,
                pages = $7, publisher = $8, pub_date = $9, price = $10, stock = $11
            WHERE book_id = $1
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(&fields.isbn)
        .bind(&fields.img)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.language)
        .bind(fields.pages)
        .bind(&fields.publisher)
        .bind(fields.pub_date)
        .bind(fields.price)
        .bind(fields.stock)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(book)
    }

    async fn book_mark_deleted(&mut self, book_id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "UPDATE books SET deleted = TRUE WHERE book_id = $1 RETURNING *",
        )
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(book)
    }

    async fn book_take_stock(&mut self, book_id: i32, quantity: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET stock = stock - $2
            WHERE book_id = $1 AND deleted = FALSE AND stock >= $2
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(quantity)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(book)
    }

    async fn books_all(&mut self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY book_id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn books_active(&mut self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE deleted = FALSE ORDER BY book_id",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn books_by_publisher(&mut self, publisher: &str) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE deleted = FALSE AND publisher = $1 ORDER BY book_id",
        )
        .bind(publisher)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn books_newest(&mut self, limit: usize) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE deleted = FALSE
            ORDER BY pub_date DESC, book_id DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn books_best_selling(&mut self, limit: usize) -> AppResult<Vec<BookSales>> {
        let rows = sqlx::query_as::<_, BookSales>(
            r#"
            SELECT b.*, SUM(oi.quantity)::bigint AS quantity_sold
            FROM books b
            JOIN order_items oi ON oi.book_id = b.book_id
            WHERE b.deleted = FALSE
            GROUP BY b.book_id
            ORDER BY quantity_sold DESC, b.book_id
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn publishers(&mut self) -> AppResult<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT publisher FROM books WHERE deleted = FALSE ORDER BY publisher",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }
}
