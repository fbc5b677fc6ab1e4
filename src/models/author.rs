//! Author model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub author_id: i32,
    pub name: String,
    pub deleted: bool,
}

/// Book ↔ author join row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BookAuthor {
    pub book_author_id: i32,
    pub book_id: i32,
    pub author_id: i32,
    pub deleted: bool,
}

/// Create or rename author request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AuthorName {
    #[validate(length(min = 1, max = 200, message = "The name is required"))]
    pub name: String,
}
