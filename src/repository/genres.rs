//! Genres and book ↔ genre join rows

use async_trait::async_trait;
use sqlx::FromRow;

use super::postgres::PgUnitOfWork;
use crate::{
    error::AppResult,
    models::{
        genre::{BookGenre, Genre},
        FindOrCreate,
    },
};

/// Row returned by the upsert; `created` is false when an existing row was hit
#[derive(FromRow)]
struct UpsertedGenre {
    #[sqlx(flatten)]
    genre: Genre,
    created: bool,
}

#[async_trait]
pub trait GenreStore: Send {
    async fn genre_by_id(&mut self, genre_id: i32) -> AppResult<Option<Genre>>;
    /// Case-insensitive lookup, deleted genres included
    async fn genre_by_name(&mut self, name: &str) -> AppResult<Option<Genre>>;
    async fn genre_insert(&mut self, name: &str) -> AppResult<Genre>;
    /// Case-insensitive upsert by name. An existing row is reactivated and
    /// reported as `Existing`; concurrent callers converge on one row.
    async fn genre_find_or_insert(&mut self, name: &str) -> AppResult<FindOrCreate<Genre>>;
    async fn genre_rename(&mut self, genre_id: i32, name: &str) -> AppResult<Option<Genre>>;
    async fn genre_set_deleted(&mut self, genre_id: i32, deleted: bool) -> AppResult<Option<Genre>>;
    async fn genres_all(&mut self) -> AppResult<Vec<Genre>>;

    /// The active join row of a book
    async fn book_genre_active(&mut self, book_id: i32) -> AppResult<Option<BookGenre>>;
    async fn book_genre_insert(&mut self, book_id: i32, genre_id: i32) -> AppResult<BookGenre>;
    /// Point the active join rows of a book at another genre; returns the rows touched
    async fn book_genre_repoint(&mut self, book_id: i32, genre_id: i32) -> AppResult<u64>;
    async fn book_genre_mark_deleted(&mut self, book_id: i32) -> AppResult<u64>;
}

#[async_trait]
impl GenreStore for PgUnitOfWork {
    async fn genre_by_id(&mut self, genre_id: i32) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>("SELECT * FROM genres WHERE genre_id = $1")
            .bind(genre_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(genre)
    }

    async fn genre_by_name(&mut self, name: &str) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>(
            "SELECT * FROM genres WHERE LOWER(name) = LOWER($1) ORDER BY genre_id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(genre)
    }

    async fn genre_insert(&mut self, name: &str) -> AppResult<Genre> {
        let genre = sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name, deleted) VALUES ($1, FALSE) RETURNING *",
        )
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(genre)
    }

    async fn genre_find_or_insert(&mut self, name: &str) -> AppResult<FindOrCreate<Genre>> {
        let row = sqlx::query_as::<_, UpsertedGenre>(
            r#"
            INSERT INTO genres (name, deleted) VALUES ($1, FALSE)
            ON CONFLICT ((LOWER(name))) DO UPDATE SET deleted = FALSE
            RETURNING *, (xmax = 0) AS created
            "#,
        )
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(if row.created {
            FindOrCreate::Created(row.genre)
        } else {
            FindOrCreate::Existing(row.genre)
        })
    }

    async fn genre_rename(&mut self, genre_id: i32, name: &str) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>(
            "UPDATE genres SET name = $2 WHERE genre_id = $1 RETURNING *",
        )
        .bind(genre_id)
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(genre)
    }

    async fn genre_set_deleted(&mut self, genre_id: i32, deleted: bool) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>(
            "UPDATE genres SET deleted = $2 WHERE genre_id = $1 RETURNING *",
        )
        .bind(genre_id)
        .bind(deleted)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(genre)
    }

    async fn genres_all(&mut self) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query_as::<_, Genre>("SELECT * FROM genres ORDER BY name")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn book_genre_active(&mut self, book_id: i32) -> AppResult<Option<BookGenre>> {
        let row = sqlx::query_as::<_, BookGenre>(
            r#"
            SELECT * FROM book_genres
            WHERE book_id = $1 AND deleted = FALSE
            ORDER BY book_genre_id
            LIMIT 1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn book_genre_insert(&mut self, book_id: i32, genre_id: i32) -> AppResult<BookGenre> {
        let row = sqlx::query_as::<_, BookGenre>(
            "INSERT INTO book_genres (book_id, genre_id, deleted) VALUES ($1, $2, FALSE) RETURNING *",
        )
        .bind(book_id)
        .bind(genre_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn book_genre_repoint(&mut self, book_id: i32, genre_id: i32) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE book_genres SET genre_id = $2 WHERE book_id = $1 AND deleted = FALSE",
        )
        .bind(book_id)
        .bind(genre_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn book_genre_mark_deleted(&mut self, book_id: i32) -> AppResult<u64> {
        let result = sqlx::query("UPDATE book_genres SET deleted = TRUE WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }
}
