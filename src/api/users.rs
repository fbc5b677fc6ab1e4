//! User management endpoints

use axum::{extract::State, http::StatusCode};
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{CreateUser, UpdateUser, User},
    AppState,
};

use super::{
    extract::{Json, Path},
    AuthenticatedUser, Envelope,
};

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<Envelope<User>>)> {
    request.validate()?;

    let user = state.services.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok("User created", user))))
}

/// Get the caller's own account
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Envelope<User>>> {
    let user = state.services.users.get(&claims, user_id).await?;
    Ok(Json(Envelope::ok("User found", user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
    Json(changes): Json<UpdateUser>,
) -> AppResult<Json<Envelope<User>>> {
    changes.validate()?;

    let user = state.services.users.update(&claims, user_id, changes).await?;
    Ok(Json(Envelope::ok("User updated", user)))
}

/// Soft delete an account (admins only)
pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Envelope<User>>> {
    let user = state.services.users.delete(&claims, user_id).await?;
    Ok(Json(Envelope::ok("User deleted", user)))
}
