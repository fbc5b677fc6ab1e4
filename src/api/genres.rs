//! Genre endpoints

use axum::{extract::State, http::StatusCode};
use validator::Validate;

use crate::{
    error::AppResult,
    models::genre::{Genre, GenreName},
    AppState,
};

use super::{
    extract::{Json, Path},
    AuthenticatedUser, Envelope,
};

/// List all genres, deleted ones included
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<Envelope<Vec<Genre>>>> {
    let genres = state.services.genres.list().await?;
    Ok(Json(Envelope::ok("Genres", genres)))
}

pub async fn get_genre(
    State(state): State<AppState>,
    Path(genre_id): Path<i32>,
) -> AppResult<Json<Envelope<Genre>>> {
    let genre = state.services.genres.get(genre_id).await?;
    Ok(Json(Envelope::ok("Genre found", genre)))
}

pub async fn create_genre(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(request): Json<GenreName>,
) -> AppResult<(StatusCode, Json<Envelope<Genre>>)> {
    request.validate()?;
    let genre = state.services.genres.create(&request.name).await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok("Genre created", genre))))
}

pub async fn rename_genre(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(genre_id): Path<i32>,
    Json(request): Json<GenreName>,
) -> AppResult<Json<Envelope<Genre>>> {
    request.validate()?;
    let genre = state.services.genres.rename(genre_id, &request.name).await?;
    Ok(Json(Envelope::ok("Genre updated", genre)))
}

pub async fn delete_genre(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(genre_id): Path<i32>,
) -> AppResult<Json<Envelope<Genre>>> {
    let genre = state.services.genres.delete(genre_id).await?;
    Ok(Json(Envelope::ok("Genre deleted", genre)))
}

pub async fn activate_genre(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(genre_id): Path<i32>,
) -> AppResult<Json<Envelope<Genre>>> {
    let genre = state.services.genres.activate(genre_id).await?;
    Ok(Json(Envelope::ok("Genre activated", genre)))
}
