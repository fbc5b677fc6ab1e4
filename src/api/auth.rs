//! Authentication endpoints

use axum::extract::State;
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{LoginRequest, LoginResponse},
    AppState,
};

use super::{extract::Json, Envelope};

/// Authenticate with email and password and receive a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<Envelope<LoginResponse>>> {
    request.validate()?;

    let response = state
        .services
        .users
        .authenticate(&request.email, &request.password)
        .await?;
    Ok(Json(Envelope::ok("Login successful", response)))
}
