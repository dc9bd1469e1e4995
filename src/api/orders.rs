use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::db::{CreateOrderRequest, RetrievalOrder, Role};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::ApiError;

/// Staff see every request; lecturers see their own
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Json<Vec<RetrievalOrder>> {
    let snapshot = state.inventory.snapshot();
    let orders = match user.role {
        Role::Staff => snapshot.orders.clone(),
        Role::Lecturer => snapshot.orders_for(&user.email),
    };
    Json(orders)
}

/// Submit a retrieval or an order request as the current user
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<RetrievalOrder>), ApiError> {
    let order = state.inventory.submit_order(&user, req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
