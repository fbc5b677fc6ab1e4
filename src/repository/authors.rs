//! Authors and book ↔ author join rows

use async_trait::async_trait;
use sqlx::FromRow;

use super::postgres::PgUnitOfWork;
use crate::{
    error::AppResult,
    models::{
        author::{Author, BookAuthor},
        FindOrCreate,
    },
};

/// Row returned by the upsert; `created` is false when an existing row was hit
#[derive(FromRow)]
struct UpsertedAuthor {
    #[sqlx(flatten)]
    author: Author,
    created: bool,
}

#[async_trait]
pub trait AuthorStore: Send {
    async fn author_by_id(&mut self, author_id: i32) -> AppResult<Option<Author>>;
    /// Case-insensitive lookup, deleted authors included
    async fn author_by_name(&mut self, name: &str) -> AppResult<Option<Author>>;
    async fn author_insert(&mut self, name: &str) -> AppResult<Author>;
    /// Case-insensitive upsert by name. An existing row is reactivated and
    /// reported as `Existing`; concurrent callers converge on one row.
    async fn author_find_or_insert(&mut self, name: &str) -> AppResult<FindOrCreate<Author>>;
    async fn author_rename(&mut self, author_id: i32, name: &str) -> AppResult<Option<Author>>;
    async fn author_set_deleted(&mut self, author_id: i32, deleted: bool) -> AppResult<Option<Author>>;
    async fn authors_all(&mut self) -> AppResult<Vec<Author>>;

    /// The active join row of a book
    async fn book_author_active(&mut self, book_id: i32) -> AppResult<Option<BookAuthor>>;
    async fn book_author_insert(&mut self, book_id: i32, author_id: i32) -> AppResult<BookAuthor>;
    /// Point the active join rows of a book at another author; returns the rows touched
    async fn book_author_repoint(&mut self, book_id: i32, author_id: i32) -> AppResult<u64>;
    async fn book_author_mark_deleted(&mut self, book_id: i32) -> AppResult<u64>;
}

#[async_trait]
impl AuthorStore for PgUnitOfWork {
    async fn author_by_id(&mut self, author_id: i32) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE author_id = $1")
            .bind(author_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(author)
    }

    async fn author_by_name(&mut self, name: &str) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT * FROM authors WHERE LOWER(name) = LOWER($1) ORDER BY author_id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(author)
    }

    async fn author_insert(&mut self, name: &str) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name, deleted) VALUES ($1, FALSE) RETURNING *",
        )
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(author)
    }

    async fn author_find_or_insert(&mut self, name: &str) -> AppResult<FindOrCreate<Author>> {
        let row = sqlx::query_as::<_, UpsertedAuthor>(
            r#"
            INSERT INTO authors (name, deleted) VALUES ($1, FALSE)
            ON CONFLICT ((LOWER(name))) DO UPDATE SET deleted = FALSE
            RETURNING *, (xmax = 0) AS created
            "#,
        )
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(if row.created {
            FindOrCreate::Created(row.author)
        } else {
            FindOrCreate::Existing(row.author)
        })
    }

    async fn author_rename(&mut self, author_id: i32, name: &str) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "UPDATE authors SET name = $2 WHERE author_id = $1 RETURNING *",
        )
        .bind(author_id)
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(author)
    }

    async fn author_set_deleted(&mut self, author_id: i32, deleted: bool) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "UPDATE authors SET deleted = $2 WHERE author_id = $1 RETURNING *",
        )
        .bind(author_id)
        .bind(deleted)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(author)
    }

    async fn authors_all(&mut self) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>("SELECT * FROM authors ORDER BY name")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn book_author_active(&mut self, book_id: i32) -> AppResult<Option<BookAuthor>> {
        let row = sqlx::query_as::<_, BookAuthor>(
            r#"
            SELECT * FROM book_authors
            WHERE book_id = $1 AND deleted = FALSE
            ORDER BY book_author_id
            LIMIT 1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn book_author_insert(&mut self, book_id: i32, author_id: i32) -> AppResult<BookAuthor> {
        let row = sqlx::query_as::<_, BookAuthor>(
            "INSERT INTO book_authors (book_id, author_id, deleted) VALUES ($1, $2, FALSE) RETURNING *",
        )
        .bind(book_id)
        .bind(author_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn book_author_repoint(&mut self, book_id: i32, author_id: i32) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE book_authors SET author_id = $2 WHERE book_id = $1 AND deleted = FALSE",
        )
        .bind(book_id)
        .bind(author_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn book_author_mark_deleted(&mut self, book_id: i32) -> AppResult<u64> {
        let result = sqlx::query("UPDATE book_authors SET deleted = TRUE WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }
}
