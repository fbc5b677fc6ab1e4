//! Rating and wishlist endpoints

use axum::extract::State;
use validator::Validate;

use crate::{
    error::AppResult,
    models::rating::{BookRatings, RateBook, Rating, UpdateWishlist},
    AppState,
};

use super::{
    extract::{Json, Path},
    AuthenticatedUser, Envelope,
};

/// Rate a book on behalf of the caller (or any user, for admins)
pub async fn rate_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<RateBook>,
) -> AppResult<Json<Envelope<Rating>>> {
    claims.require_self_or_admin(request.user_id)?;
    request.validate()?;

    let rating = state.services.ratings.rate(request).await?;
    Ok(Json(Envelope::ok("Rating saved", rating)))
}

/// Active comments of a book and their average score
pub async fn book_ratings(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
) -> AppResult<Json<Envelope<BookRatings>>> {
    let ratings = state.services.ratings.book_ratings(book_id).await?;
    Ok(Json(Envelope::ok("Book ratings", ratings)))
}

pub async fn update_wishlist(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateWishlist>,
) -> AppResult<Json<Envelope<Rating>>> {
    claims.require_self_or_admin(request.user_id)?;

    let rating = state.services.ratings.update_wishlist(request).await?;
    Ok(Json(Envelope::ok("Wishlist updated", rating)))
}

pub async fn delete_rating(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(rating_id): Path<i32>,
) -> AppResult<Json<Envelope<Rating>>> {
    let rating = state.services.ratings.get(rating_id).await?;
    claims.require_self_or_admin(rating.user_id)?;

    let rating = state.services.ratings.delete(rating_id).await?;
    Ok(Json(Envelope::ok("Rating deleted", rating)))
}

pub async fn activate_rating(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(rating_id): Path<i32>,
) -> AppResult<Json<Envelope<Rating>>> {
    let rating = state.services.ratings.get(rating_id).await?;
    claims.require_self_or_admin(rating.user_id)?;

    let rating = state.services.ratings.activate(rating_id).await?;
    Ok(Json(Envelope::ok("Rating activated", rating)))
}
