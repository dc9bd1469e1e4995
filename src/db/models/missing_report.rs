//! Missing item report models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct MissingReportRow {
    pub id: String,
    pub item_id: String,
    pub item_name: String,
    pub reported_by: String,
    pub quantity: i64,
    pub notes: Option<String>,
    pub date: String,
}

/// Append-only record of a stock discrepancy. Does not change stock counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingReport {
    pub id: String,
    pub item_id: String,
    pub item_name: String,
    pub reported_by: String,
    pub quantity: i64,
    pub notes: Option<String>,
    pub date: String,
}

impl From<MissingReportRow> for MissingReport {
    fn from(row: MissingReportRow) -> Self {
        Self {
            id: row.id,
            item_id: row.item_id,
            item_name: row.item_name,
            reported_by: row.reported_by,
            quantity: row.quantity,
            notes: row.notes,
            date: row.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMissingReport {
    pub item_id: String,
    pub item_name: String,
    pub reported_by: String,
    pub quantity: i64,
    pub notes: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMissingReportRequest {
    #[serde(default)]
    pub item_id: String,
    pub quantity: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MissingReportQuery {
    pub limit: Option<usize>,
}
