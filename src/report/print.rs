use askama::Template;

use super::{ItemLine, ReportError, StockReport};
use crate::db::Category;

#[derive(Template)]
#[template(path = "stock_report.html")]
struct StockReportTemplate<'a> {
    report: &'a StockReport,
    op_stock: Vec<&'a ItemLine>,
    op_non_stock: Vec<&'a ItemLine>,
}

/// Printable HTML page for the stock report, items grouped by category.
/// The browser's print dialog opens on load.
pub fn render_print_view(report: &StockReport) -> Result<String, ReportError> {
    let template = StockReportTemplate {
        report,
        op_stock: report.items_in(Category::OpStock),
        op_non_stock: report.items_in(Category::OpNonStock),
    };
    Ok(template.render()?)
}
