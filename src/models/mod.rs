//! Data models for the bookstore

pub mod author;
pub mod book;
pub mod genre;
pub mod order;
pub mod rating;
pub mod user;

// Re-export commonly used types
pub use author::{Author, BookAuthor};
pub use book::{Book, BookDetail, BookSales, LinkedBook};
pub use genre::{BookGenre, Genre};
pub use order::{Order, OrderDetail, OrderItem};
pub use rating::Rating;
pub use user::{User, UserClaims};

/// Outcome of a lookup-by-name that creates the row when it is missing
#[derive(Debug, Clone, PartialEq)]
pub enum FindOrCreate<T> {
    Existing(T),
    Created(T),
}

impl<T> FindOrCreate<T> {
    pub fn get(&self) -> &T {
        match self {
            FindOrCreate::Existing(value) | FindOrCreate::Created(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            FindOrCreate::Existing(value) | FindOrCreate::Created(value) => value,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, FindOrCreate::Created(_))
    }
}
