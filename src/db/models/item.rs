//! Stationery item models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Inventory category of a stationery item.
///
/// `OP Stock` items are centrally stocked; `OP Non-Stock` items are tracked
/// individually and usually carry brand and unit price metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "OP Stock")]
    OpStock,
    #[serde(rename = "OP Non-Stock")]
    OpNonStock,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::OpStock, Category::OpNonStock];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::OpStock => "OP Stock",
            Category::OpNonStock => "OP Non-Stock",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "OP Stock" => Some(Category::OpStock),
            "OP Non-Stock" => Some(Category::OpNonStock),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Row as stored in `stationery_items`
#[derive(Debug, Clone, FromRow)]
pub struct StationeryItemRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub total_stock: i64,
    pub available_stock: i64,
    pub unit: String,
    pub brand: Option<String>,
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationeryItem {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub total_stock: i64,
    pub available_stock: i64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
}

impl From<StationeryItemRow> for StationeryItem {
    fn from(row: StationeryItemRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            // The schema constrains the column, so an unknown value only shows up
            // in hand-edited databases.
            category: Category::from_str(&row.category).unwrap_or(Category::OpStock),
            total_stock: row.total_stock,
            available_stock: row.available_stock,
            unit: row.unit,
            brand: row.brand,
            unit_price: row.unit_price,
        }
    }
}

/// Validated item ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewStationeryItem {
    pub name: String,
    pub category: Category,
    pub total_stock: i64,
    pub available_stock: i64,
    pub unit: String,
    pub brand: Option<String>,
    pub unit_price: Option<f64>,
}

// DTOs for API

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_category")]
    pub category: Category,
    #[serde(default)]
    pub total_stock: f64,
    #[serde(default)]
    pub available_stock: f64,
    #[serde(default)]
    pub unit: String,
    pub brand: Option<String>,
    pub unit_price: Option<f64>,
}

fn default_category() -> Category {
    Category::OpStock
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockRequest {
    pub available_stock: f64,
}
