//! Book (catalog entry) model and related types

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use super::{author::Author, genre::Genre, rating::Rating};

/// ISBN-10 or ISBN-13, hyphens and spaces allowed
static ISBN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[0-9][- ]?){9}[0-9Xx]$|^(?:[0-9][- ]?){12}[0-9]$").unwrap());

/// Number of books returned by the "news" and "best sellers" queries
pub const SHOWCASE_LIMIT: usize = 10;

/// Book row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub book_id: i32,
    pub isbn: String,
    /// Cover image path, relative to the site root
    pub img: Option<String>,
    pub title: String,
    pub description: String,
    pub language: String,
    pub pages: i32,
    pub publisher: String,
    pub pub_date: NaiveDate,
    pub price: Decimal,
    pub stock: i32,
    pub deleted: bool,
}

/// Book with the total quantity sold across all orders
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookSales {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub book: Book,
    #[serde(rename = "quantitysold")]
    pub quantity_sold: i64,
}

/// Bibliographic fields shared by create and update requests
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookFields {
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: String,
    pub img: Option<String>,
    #[validate(length(min = 1, message = "The title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "The description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "The language is required"))]
    pub language: String,
    #[validate(range(min = 1, message = "The pages must be positive"))]
    pub pages: i32,
    #[validate(length(min = 1, message = "The publisher is required"))]
    pub publisher: String,
    pub pub_date: NaiveDate,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[validate(range(min = 0, message = "The stock cannot be negative"))]
    pub stock: i32,
}

/// Create book request: genre and author are given by name
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBook {
    #[serde(flatten)]
    #[validate(nested)]
    pub fields: BookFields,
    #[validate(length(min = 1, message = "The genre is required"))]
    pub genre: String,
    #[validate(length(min = 1, message = "The author is required"))]
    pub author: String,
}

/// Update book request: genre and author are given by id
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateBook {
    #[serde(flatten)]
    #[validate(nested)]
    pub fields: BookFields,
    pub genre_id: i32,
    pub author_id: i32,
}

/// Publisher filter for `/book/bypublisher`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublisherQuery {
    #[serde(default)]
    pub publisher: String,
}

/// Full book detail: the book, its genre and author, the caller's wishlist
/// flag (null for anonymous callers) and the active comments
#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    pub book: Book,
    pub genre: Option<Genre>,
    pub author: Option<Author>,
    pub wishlist: Option<bool>,
    pub comments: Vec<Rating>,
}

/// Book together with the genre and author it is linked to
#[derive(Debug, Clone, Serialize)]
pub struct LinkedBook {
    pub book: Book,
    pub genre: Genre,
    pub author: Author,
}

/// `GET /book/{book_id}&{user_id}` path segment. The user part is optional
/// and `0` means anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookLookup {
    pub book_id: i32,
    pub user_id: i32,
}

impl std::str::FromStr for BookLookup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (book, user) = match s.split_once('&') {
            Some((book, user)) => (book, user),
            None => (s, "0"),
        };
        let book_id = book
            .trim()
            .parse()
            .map_err(|_| format!("Invalid book id: {}", book))?;
        let user_id = user
            .trim()
            .parse()
            .map_err(|_| format!("Invalid user id: {}", user))?;
        Ok(BookLookup { book_id, user_id })
    }
}

fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    if ISBN_RE.is_match(isbn.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("isbn").with_message("The isbn is invalid".into()))
    }
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("price").with_message("The price cannot be negative".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_lookup_parse() {
        assert_eq!(
            "12&3".parse::<BookLookup>(),
            Ok(BookLookup { book_id: 12, user_id: 3 })
        );
        assert_eq!(
            "12".parse::<BookLookup>(),
            Ok(BookLookup { book_id: 12, user_id: 0 })
        );
        assert!("abc&1".parse::<BookLookup>().is_err());
        assert!("1&x".parse::<BookLookup>().is_err());
    }

    #[test]
    fn test_isbn_validation() {
        assert!(validate_isbn("9789569545344").is_ok());
        assert!(validate_isbn("978-956-954-534-4").is_ok());
        assert!(validate_isbn("84-376-0494-X").is_ok());
        assert!(validate_isbn("12345").is_err());
        assert!(validate_isbn("not-an-isbn").is_err());
    }

    #[test]
    fn test_create_book_deserializes_flattened_fields() {
        let body = serde_json::json!({
            "isbn": "9789569545344",
            "title": "La casa de los espíritus",
            "description": "Novela",
            "language": "Español",
            "pages": 500,
            "publisher": "Sudamericana",
            "pub_date": "1982-01-01",
            "price": 13990,
            "stock": 10,
            "genre": "Novela",
            "author": "Isabel Allende"
        });
        let book: CreateBook = serde_json::from_value(body).unwrap();
        assert_eq!(book.fields.pages, 500);
        assert_eq!(book.fields.price, Decimal::from(13990));
        assert_eq!(book.author, "Isabel Allende");
        assert!(book.validate().is_ok());
    }
}
