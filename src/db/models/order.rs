//! Retrieval and order request models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// What a request asks for.
///
/// A retrieval draws from existing available stock; an order asks for new
/// stock to be procured and is not bounded by what is on the shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Retrieval,
    Order,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Retrieval => "retrieval",
            OrderType::Order => "order",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "retrieval" => Some(OrderType::Retrieval),
            "order" => Some(OrderType::Order),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request status. Assigned by the store on insert and never transitioned
/// by this application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Completed => "completed",
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "approved" => Self::Approved,
            "completed" => Self::Completed,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RetrievalOrderRow {
    pub id: String,
    #[sqlx(rename = "type")]
    pub order_type: String,
    pub user_email: String,
    pub item_id: String,
    pub item_name: String,
    pub quantity: i64,
    pub notes: Option<String>,
    pub date: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalOrder {
    pub id: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub user_email: String,
    pub item_id: String,
    pub item_name: String,
    pub quantity: i64,
    pub notes: Option<String>,
    pub date: String,
    pub status: OrderStatus,
}

impl From<RetrievalOrderRow> for RetrievalOrder {
    fn from(row: RetrievalOrderRow) -> Self {
        Self {
            id: row.id,
            order_type: OrderType::from_str(&row.order_type).unwrap_or(OrderType::Retrieval),
            user_email: row.user_email,
            item_id: row.item_id,
            item_name: row.item_name,
            quantity: row.quantity,
            notes: row.notes,
            date: row.date,
            status: OrderStatus::from(row.status),
        }
    }
}

/// Validated request ready to be inserted. `date` and `status` are left to
/// the store defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRetrievalOrder {
    pub order_type: OrderType,
    pub user_email: String,
    pub item_id: String,
    pub item_name: String,
    pub quantity: i64,
    pub notes: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(default)]
    pub item_id: String,
    pub quantity: Option<f64>,
    #[serde(default)]
    pub notes: String,
}
