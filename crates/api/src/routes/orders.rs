//! Order Routes

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use storage::{NewOrder, Order};

use crate::auth::AuthUser;
use crate::{ApiError, SharedState};

#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub success: bool,
    pub order: Order,
}

/// The caller's orders, newest first
pub async fn list(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    let state = state.read().await;
    Ok(Json(state.repository.orders_for_user(user.id)?))
}

/// Place an order for the caller; starts as `processing`
pub async fn create(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<NewOrder>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new) = payload?;
    let state = state.read().await;
    let order = state.repository.create_order(user.id, new)?;
    metrics::counter!("storefront_orders_total").increment(1);

    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            success: true,
            order,
        }),
    ))
}
