use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::db::{MissingReport, RetrievalOrder, Role, StationeryItem, User};
use crate::inventory::RECENT_MISSING_REPORTS;
use crate::AppState;

use super::auth::CurrentUser;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_items: usize,
    pub total_available_stock: i64,
    pub low_stock_items: usize,
}

/// Role-specific landing data. Lecturers get no stats and no missing reports.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user: User,
    pub role_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<DashboardStats>,
    pub items: Vec<StationeryItem>,
    pub orders: Vec<RetrievalOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_reports: Option<Vec<MissingReport>>,
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Json<Dashboard> {
    let snapshot = state.inventory.snapshot();

    let dashboard = match user.role {
        Role::Lecturer => Dashboard {
            role_label: user.role.label(),
            stats: None,
            items: snapshot.items.clone(),
            orders: snapshot.orders_for(&user.email),
            missing_reports: None,
            user,
        },
        Role::Staff => {
            let report = state.inventory.stock_report(chrono::Utc::now());
            Dashboard {
                role_label: user.role.label(),
                stats: Some(DashboardStats {
                    total_items: report.total_items,
                    total_available_stock: report.total_available_stock,
                    low_stock_items: report.low_stock_items,
                }),
                items: snapshot.items.clone(),
                orders: snapshot.orders.clone(),
                missing_reports: Some(snapshot.recent_missing_reports(RECENT_MISSING_REPORTS)),
                user,
            }
        }
    };

    Json(dashboard)
}
