//! API handlers for the bookstore REST endpoints

pub mod auth;
pub mod authors;
pub mod books;
pub mod extract;
pub mod genres;
pub mod health;
pub mod orders;
pub mod ratings;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Uniform response body: `status` is false for every error, and `data` is
/// null whenever there is nothing to return.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/book", post(books::create_book))
        .route("/book/:book_id", get(books::get_book).put(books::update_book))
        .route("/book/delete/:book_id", put(books::delete_book))
        .route("/book/news", post(books::list_newest))
        .route("/book/bypublisher", post(books::list_by_publisher))
        .route("/book/allPublishers", post(books::list_publishers))
        .route("/book/moresold", post(books::list_best_sellers))
        .route("/book/all", post(books::list_all))
        .route("/book/active", post(books::list_active))
        .route("/book/wishlist/:user_id", get(books::wishlist_books))
        // Genres
        .route("/genre", get(genres::list_genres).post(genres::create_genre))
        .route(
            "/genre/:genre_id",
            get(genres::get_genre)
                .put(genres::rename_genre)
                .delete(genres::delete_genre),
        )
        .route("/genre/activate/:genre_id", put(genres::activate_genre))
        // Authors
        .route("/author", get(authors::list_authors).post(authors::create_author))
        .route(
            "/author/:author_id",
            get(authors::get_author)
                .put(authors::rename_author)
                .delete(authors::delete_author),
        )
        .route("/author/activate/:author_id", put(authors::activate_author))
        // Ratings
        .route("/rating", post(ratings::rate_book))
        .route("/rating/book/:book_id", get(ratings::book_ratings))
        .route("/rating/wishlist", put(ratings::update_wishlist))
        .route("/rating/:rating_id", delete(ratings::delete_rating))
        .route("/rating/activate/:rating_id", put(ratings::activate_rating))
        // Users and authentication
        .route("/login", post(auth::login))
        .route("/user", post(users::register))
        .route(
            "/user/:user_id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Orders
        .route("/orders", post(orders::checkout))
        .route("/orders/user/:user_id", get(orders::orders_for_user))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
