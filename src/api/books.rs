//! Catalog endpoints

use axum::{extract::State, http::StatusCode};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{
        Book, BookDetail, BookLookup, BookSales, CreateBook, LinkedBook, PublisherQuery, UpdateBook,
    },
    AppState,
};

use super::{
    extract::{Json, Path},
    AuthenticatedUser, Envelope,
};

/// Get a book by `{book_id}&{user_id}`; the user part fills in the
/// wishlist flag
pub async fn get_book(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> AppResult<Json<Envelope<BookDetail>>> {
    let lookup: BookLookup = segment.parse().map_err(AppError::BadRequest)?;
    let detail = state.services.catalog.get_book(lookup).await?;
    Ok(Json(Envelope::ok("Book found", detail)))
}

/// Create a book, resolving its genre and author by name
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Envelope<LinkedBook>>)> {
    request.validate()?;
    tracing::debug!("User {} creates book {}", claims.user_id, request.fields.title);

    let created = state.services.catalog.create_book(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Book created", created)),
    ))
}

pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
    Json(request): Json<UpdateBook>,
) -> AppResult<Json<Envelope<LinkedBook>>> {
    request.validate()?;
    let updated = state.services.catalog.update_book(book_id, request).await?;
    Ok(Json(Envelope::ok("Book updated", updated)))
}

/// Soft delete a book
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<Json<Envelope<Book>>> {
    let book = state.services.catalog.delete_book(book_id).await?;
    Ok(Json(Envelope::ok("Book deleted", book)))
}

/// Ten most recently published books
pub async fn list_newest(State(state): State<AppState>) -> AppResult<Json<Envelope<Vec<Book>>>> {
    let books = state.services.catalog.list_newest().await?;
    Ok(Json(Envelope::ok("Newest books", books)))
}

pub async fn list_by_publisher(
    State(state): State<AppState>,
    Json(query): Json<PublisherQuery>,
) -> AppResult<Json<Envelope<Vec<Book>>>> {
    let books = state
        .services
        .catalog
        .list_by_publisher(&query.publisher)
        .await?;
    Ok(Json(Envelope::ok("Books by publisher", books)))
}

pub async fn list_publishers(State(state): State<AppState>) -> AppResult<Json<Envelope<Vec<String>>>> {
    let publishers = state.services.catalog.list_publishers().await?;
    Ok(Json(Envelope::ok("Publishers", publishers)))
}

/// Ten best selling books with the quantity sold
pub async fn list_best_sellers(
    State(state): State<AppState>,
) -> AppResult<Json<Envelope<Vec<BookSales>>>> {
    let books = state.services.catalog.list_best_sellers().await?;
    Ok(Json(Envelope::ok("Best selling books", books)))
}

/// Every book, deleted ones included
pub async fn list_all(State(state): State<AppState>) -> AppResult<Json<Envelope<Vec<Book>>>> {
    let books = state.services.catalog.list_all().await?;
    Ok(Json(Envelope::ok("All books", books)))
}

pub async fn list_active(State(state): State<AppState>) -> AppResult<Json<Envelope<Vec<Book>>>> {
    let books = state.services.catalog.list_active().await?;
    Ok(Json(Envelope::ok("Active books", books)))
}

/// Books on a user's wishlist
pub async fn wishlist_books(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Envelope<Vec<Book>>>> {
    let books = state.services.catalog.wishlist_books(user_id).await?;
    Ok(Json(Envelope::ok("Wishlist", books)))
}
