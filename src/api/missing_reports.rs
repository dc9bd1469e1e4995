use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{CreateMissingReportRequest, MissingReport, MissingReportQuery};
use crate::inventory::RECENT_MISSING_REPORTS;
use crate::AppState;

use super::auth::StaffUser;
use super::error::ApiError;

/// Most recent missing reports, newest first. `?limit=` widens the window.
pub async fn list_missing_reports(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Query(query): Query<MissingReportQuery>,
) -> Json<Vec<MissingReport>> {
    let limit = query.limit.unwrap_or(RECENT_MISSING_REPORTS);
    Json(state.inventory.snapshot().recent_missing_reports(limit))
}

pub async fn create_missing_report(
    State(state): State<Arc<AppState>>,
    StaffUser(user): StaffUser,
    Json(req): Json<CreateMissingReportRequest>,
) -> Result<(StatusCode, Json<MissingReport>), ApiError> {
    let report = state.inventory.report_missing(&user, req).await?;
    Ok((StatusCode::CREATED, Json(report)))
}
