//! Author endpoints

use axum::{extract::State, http::StatusCode};
use validator::Validate;

use crate::{
    error::AppResult,
    models::author::{Author, AuthorName},
    AppState,
};

use super::{
    extract::{Json, Path},
    AuthenticatedUser, Envelope,
};

/// List all authors
pub async fn list_authors(State(state): State<AppState>) -> AppResult<Json<Envelope<Vec<Author>>>> {
    let authors = state.services.authors.list().await?;
    Ok(Json(Envelope::ok("Authors", authors)))
}

pub async fn get_author(
    State(state): State<AppState>,
    Path(author_id): Path<i32>,
) -> AppResult<Json<Envelope<Author>>> {
    let author = state.services.authors.get(author_id).await?;
    Ok(Json(Envelope::ok("Author found", author)))
}

pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(request): Json<AuthorName>,
) -> AppResult<(StatusCode, Json<Envelope<Author>>)> {
    request.validate()?;
    let author = state.services.authors.create(&request.name).await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok("Author created", author))))
}

pub async fn rename_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(author_id): Path<i32>,
    Json(request): Json<AuthorName>,
) -> AppResult<Json<Envelope<Author>>> {
    request.validate()?;
    let author = state.services.authors.rename(author_id, &request.name).await?;
    Ok(Json(Envelope::ok("Author updated", author)))
}

pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(author_id): Path<i32>,
) -> AppResult<Json<Envelope<Author>>> {
    let author = state.services.authors.delete(author_id).await?;
    Ok(Json(Envelope::ok("Author deleted", author)))
}

pub async fn activate_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(author_id): Path<i32>,
) -> AppResult<Json<Envelope<Author>>> {
    let author = state.services.authors.activate(author_id).await?;
    Ok(Json(Envelope::ok("Author activated", author)))
}
