//! Rating model.
//!
//! A single row per (user, book) pair carries both the user's review (score
//! and comment) and the wishlist marker for that book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Score given to rows created implicitly by a wishlist toggle
pub const DEFAULT_SCORE: i16 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub rating_id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub score: i16,
    pub comment: String,
    pub wishlist: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values written to a (user, book) rating row
#[derive(Debug, Clone, PartialEq)]
pub struct RatingValues {
    pub user_id: i32,
    pub book_id: i32,
    pub score: i16,
    pub comment: String,
    pub wishlist: bool,
}

/// Create or overwrite the caller's rating of a book
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RateBook {
    pub user_id: i32,
    pub book_id: i32,
    #[validate(range(min = 1, max = 5, message = "The score must be between 1 and 5"))]
    pub score: i16,
    #[serde(default)]
    #[validate(length(max = 2000, message = "The comment is too long"))]
    pub comment: String,
    pub wishlist: Option<bool>,
}

/// Toggle a book on or off a user's wishlist
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWishlist {
    pub user_id: i32,
    pub book_id: i32,
    pub wishlist: bool,
}

/// Active comments of a book together with their mean score
#[derive(Debug, Clone, Serialize)]
pub struct BookRatings {
    pub score: f64,
    pub comments: Vec<Rating>,
}

/// Mean score of the given ratings, 0 when there are none
pub fn average_score(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let total: i64 = ratings.iter().map(|r| r.score as i64).sum();
    total as f64 / ratings.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(score: i16) -> Rating {
        let now = Utc::now();
        Rating {
            rating_id: 1,
            user_id: 1,
            book_id: 1,
            score,
            comment: String::new(),
            wishlist: false,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_average_score() {
        assert_eq!(average_score(&[]), 0.0);
        assert_eq!(average_score(&[rating(4), rating(5), rating(3)]), 4.0);
        assert_eq!(average_score(&[rating(1), rating(2)]), 1.5);
    }
}
