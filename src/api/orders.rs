//! Order endpoints

use axum::{extract::State, http::StatusCode};
use validator::Validate;

use crate::{
    error::AppResult,
    models::order::{Checkout, OrderDetail},
    AppState,
};

use super::{
    extract::{Json, Path},
    AuthenticatedUser, Envelope,
};

/// Place an order for the caller (or any user, for admins)
pub async fn checkout(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<Checkout>,
) -> AppResult<(StatusCode, Json<Envelope<OrderDetail>>)> {
    claims.require_self_or_admin(request.user_id)?;
    request.validate()?;

    let order = state.services.orders.checkout(request).await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok("Order placed", order))))
}

pub async fn orders_for_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Envelope<Vec<OrderDetail>>>> {
    claims.require_self_or_admin(user_id)?;

    let orders = state.services.orders.orders_for_user(user_id).await?;
    Ok(Json(Envelope::ok("Orders", orders)))
}
