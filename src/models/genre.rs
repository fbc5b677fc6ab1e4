//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Genre {
    pub genre_id: i32,
    pub name: String,
    pub deleted: bool,
}

/// Book ↔ genre join row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BookGenre {
    pub book_genre_id: i32,
    pub book_id: i32,
    pub genre_id: i32,
    pub deleted: bool,
}

/// Create or rename genre request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenreName {
    #[validate(length(min = 1, max = 100, message = "The name is required"))]
    pub name: String,
}
