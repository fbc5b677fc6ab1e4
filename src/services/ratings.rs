//! Ratings service: reviews and wishlist markers.
//!
//! A (user, book) pair owns at most one rating row, shared by the review and
//! the wishlist flag.

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::rating::{
        average_score, BookRatings, RateBook, Rating, RatingValues, UpdateWishlist, DEFAULT_SCORE,
    },
    repository::{Repository, UnitOfWork},
};

#[derive(Clone)]
pub struct RatingsService {
    repository: Arc<dyn Repository>,
}

fn rating_not_found(rating_id: i32) -> AppError {
    AppError::NotFound(format!("Rating {} not found", rating_id))
}

async fn ensure_book(uow: &mut dyn UnitOfWork, book_id: i32) -> AppResult<()> {
    match uow.book_by_id(book_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("Book {} not found", book_id))),
    }
}

impl RatingsService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Create or overwrite the caller's review of a book. The wishlist flag
    /// is kept when the request leaves it out.
    pub async fn rate(&self, request: RateBook) -> AppResult<Rating> {
        let mut uow = self.repository.begin().await?;
        ensure_book(uow.as_mut(), request.book_id).await?;

        let values = RatingValues {
            user_id: request.user_id,
            book_id: request.book_id,
            score: request.score,
            comment: request.comment,
            wishlist: request.wishlist.unwrap_or(false),
        };
        let rating = uow
            .rating_upsert_review(&values, request.wishlist.is_none())
            .await?;
        uow.commit().await?;

        tracing::info!(
            "Book {} rated {} by user {}",
            rating.book_id,
            rating.score,
            rating.user_id
        );
        Ok(rating)
    }

    /// Put a book on or off a user's wishlist, creating the pair's row with
    /// a default review when there is none.
    pub async fn update_wishlist(&self, request: UpdateWishlist) -> AppResult<Rating> {
        let UpdateWishlist {
            user_id,
            book_id,
            wishlist,
        } = request;
        let mut uow = self.repository.begin().await?;
        ensure_book(uow.as_mut(), book_id).await?;

        let fresh = RatingValues {
            user_id,
            book_id,
            score: DEFAULT_SCORE,
            comment: String::new(),
            wishlist,
        };
        let rating = uow.rating_upsert_wishlist(&fresh).await?;
        uow.commit().await?;

        tracing::info!("Wishlist of user {}: book {} -> {}", user_id, book_id, wishlist);
        Ok(rating)
    }

    pub async fn get(&self, rating_id: i32) -> AppResult<Rating> {
        let mut uow = self.repository.begin().await?;
        uow.rating_by_id(rating_id)
            .await?
            .ok_or_else(|| rating_not_found(rating_id))
    }

    /// Active reviews of a book
    pub async fn comments_for_book(&self, book_id: i32) -> AppResult<Vec<Rating>> {
        let mut uow = self.repository.begin().await?;
        uow.ratings_active_by_book(book_id).await
    }

    /// Mean score of the active reviews of a book, 0 when there are none
    pub async fn average_score(&self, book_id: i32) -> AppResult<f64> {
        let comments = self.comments_for_book(book_id).await?;
        Ok(average_score(&comments))
    }

    /// Active reviews of a book with their mean score
    pub async fn book_ratings(&self, book_id: i32) -> AppResult<BookRatings> {
        let comments = self.comments_for_book(book_id).await?;
        tracing::debug!("Book {} has {} active ratings", book_id, comments.len());
        Ok(BookRatings {
            score: average_score(&comments),
            comments,
        })
    }

    /// Wishlisted rows of a user
    pub async fn wishlist(&self, user_id: i32) -> AppResult<Vec<Rating>> {
        let mut uow = self.repository.begin().await?;
        uow.ratings_wishlist_by_user(user_id).await
    }

    pub async fn delete(&self, rating_id: i32) -> AppResult<Rating> {
        self.set_deleted(rating_id, true).await
    }

    pub async fn activate(&self, rating_id: i32) -> AppResult<Rating> {
        self.set_deleted(rating_id, false).await
    }

    async fn set_deleted(&self, rating_id: i32, deleted: bool) -> AppResult<Rating> {
        let mut uow = self.repository.begin().await?;
        let rating = uow
            .rating_set_deleted(rating_id, deleted)
            .await?
            .ok_or_else(|| rating_not_found(rating_id))?;
        uow.commit().await?;
        tracing::info!("Rating {} deleted={}", rating_id, deleted);
        Ok(rating)
    }
}
