//! Ratings repository

use async_trait::async_trait;
use chrono::Utc;

use super::postgres::PgUnitOfWork;
use crate::{
    error::AppResult,
    models::rating::{Rating, RatingValues},
};

#[async_trait]
pub trait RatingStore: Send {
    async fn rating_by_id(&mut self, rating_id: i32) -> AppResult<Option<Rating>>;
    /// The row of a (user, book) pair, deleted or not
    async fn rating_by_pair(&mut self, user_id: i32, book_id: i32) -> AppResult<Option<Rating>>;
    /// Write the review of a pair, inserting the row or overwriting score,
    /// comment and wishlist of the existing one and marking it active again.
    /// With `keep_wishlist` an active row keeps its current flag.
    async fn rating_upsert_review(&mut self, values: &RatingValues, keep_wishlist: bool) -> AppResult<Rating>;
    /// Set the wishlist flag of a pair. A missing row is inserted from
    /// `values`; a deleted one is overwritten by them and reactivated.
    async fn rating_upsert_wishlist(&mut self, values: &RatingValues) -> AppResult<Rating>;
    async fn rating_set_deleted(&mut self, rating_id: i32, deleted: bool) -> AppResult<Option<Rating>>;
    async fn ratings_active_by_book(&mut self, book_id: i32) -> AppResult<Vec<Rating>>;
    /// Active wishlisted rows of a user, oldest first
    async fn ratings_wishlist_by_user(&mut self, user_id: i32) -> AppResult<Vec<Rating>>;
}

#[async_trait]
impl RatingStore for PgUnitOfWork {
    async fn rating_by_id(&mut self, rating_id: i32) -> AppResult<Option<Rating>> {
        let rating = sqlx::query_as::<_, Rating>("SELECT * FROM ratings WHERE rating_id = $1")
            .bind(rating_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(rating)
    }

    async fn rating_by_pair(&mut self, user_id: i32, book_id: i32) -> AppResult<Option<Rating>> {
        let rating = sqlx::query_as::<_, Rating>(
            "SELECT * FROM ratings WHERE user_id = $1 AND book_id = $2",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(rating)
    }

    async fn rating_upsert_review(&mut self, values: &RatingValues, keep_wishlist: bool) -> AppResult<Rating> {
        let rating = sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (user_id, book_id, score, comment, wishlist, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $7, $7)
            ON CONFLICT (user_id, book_id) DO UPDATE SET
                score = EXCLUDED.score,
                comment = EXCLUDED.comment,
                wishlist = CASE WHEN $6 AND NOT ratings.deleted
                                THEN ratings.wishlist
                                ELSE EXCLUDED.wishlist END,
                deleted = FALSE,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(values.user_id)
        .bind(values.book_id)
        .bind(values.score)
        .bind(&values.comment)
        .bind(values.wishlist)
        .bind(keep_wishlist)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(rating)
    }

    async fn rating_upsert_wishlist(&mut self, values: &RatingValues) -> AppResult<Rating> {
        let rating = sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (user_id, book_id, score, comment, wishlist, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, $6)
            ON CONFLICT (user_id, book_id) DO UPDATE SET
                score = CASE WHEN ratings.deleted THEN EXCLUDED.score ELSE ratings.score END,
                comment = CASE WHEN ratings.deleted THEN EXCLUDED.comment ELSE ratings.comment END,
                wishlist = EXCLUDED.wishlist,
                deleted = FALSE,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(values.user_id)
        .bind(values.book_id)
        .bind(values.score)
        .bind(&values.comment)
        .bind(values.wishlist)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(rating)
    }

    async fn rating_set_deleted(&mut self, rating_id: i32, deleted: bool) -> AppResult<Option<Rating>> {
        let rating = sqlx::query_as::<_, Rating>(
            "UPDATE ratings SET deleted = $2, updated_at = $3 WHERE rating_id = $1 RETURNING *",
        )
        .bind(rating_id)
        .bind(deleted)
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(rating)
    }

    async fn ratings_active_by_book(&mut self, book_id: i32) -> AppResult<Vec<Rating>> {
        let rows = sqlx::query_as::<_, Rating>(
            "SELECT * FROM ratings WHERE book_id = $1 AND deleted = FALSE ORDER BY created_at, rating_id",
        )
        .bind(book_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn ratings_wishlist_by_user(&mut self, user_id: i32) -> AppResult<Vec<Rating>> {
        let rows = sqlx::query_as::<_, Rating>(
            r#"
            SELECT * FROM ratings
            WHERE user_id = $1 AND wishlist = TRUE AND deleted = FALSE
            ORDER BY created_at, rating_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }
}
