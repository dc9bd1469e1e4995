use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::report::{render_pdf, render_print_view, StockReport};
use crate::AppState;

use super::auth::StaffUser;
use super::error::ApiError;

/// Stock summary as JSON
pub async fn stock_report(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
) -> Json<StockReport> {
    Json(state.inventory.stock_report(Utc::now()))
}

/// Stock report as a PDF download
pub async fn stock_report_pdf(
    State(state): State<Arc<AppState>>,
    StaffUser(user): StaffUser,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.inventory.stock_report(Utc::now());
    let filename = format!("{}.pdf", report.title);

    let bytes = tokio::task::spawn_blocking(move || render_pdf(&report))
        .await
        .map_err(|e| ApiError::internal(format!("PDF task failed: {}", e)))??;

    tracing::info!(user = %user.email, file = %filename, size = bytes.len(), "Exported stock report PDF");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}

/// Printable HTML view of the stock report
pub async fn stock_report_print(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
) -> Result<Html<String>, ApiError> {
    let report = state.inventory.stock_report(Utc::now());
    Ok(Html(render_print_view(&report)?))
}
