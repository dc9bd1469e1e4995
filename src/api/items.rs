use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{CreateItemRequest, StationeryItem, UpdateStockRequest};
use crate::AppState;

use super::auth::{CurrentUser, StaffUser};
use super::error::ApiError;

/// List stationery items, sorted by name
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Json<Vec<StationeryItem>> {
    Json(state.inventory.snapshot().items.clone())
}

/// Add a stationery item
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    StaffUser(user): StaffUser,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<StationeryItem>), ApiError> {
    tracing::debug!(user = %user.email, name = %req.name, "Adding stationery item");
    let item = state.inventory.add_item(req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Set an item's available stock
pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    StaffUser(_user): StaffUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStockRequest>,
) -> Result<Json<StationeryItem>, ApiError> {
    let item = state
        .inventory
        .update_available_stock(&id, req.available_stock)
        .await?;
    Ok(Json(item))
}

/// Delete an item that no order or missing report references
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    StaffUser(user): StaffUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!(user = %user.email, item_id = %id, "Deleting stationery item");
    state.inventory.delete_item(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
