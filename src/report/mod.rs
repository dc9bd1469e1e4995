//! Stock report aggregation.
//!
//! `StockReport` is computed from an item list at a point in time and feeds
//! the JSON summary, the HTML print view and the PDF export.

mod pdf;
mod print;

pub use pdf::render_pdf;
pub use print::render_print_view;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::db::{Category, StationeryItem};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF rendering failed: {0}")]
    Pdf(#[from] printpdf::Error),

    #[error("print view rendering failed: {0}")]
    Template(#[from] askama::Error),
}

/// Items below this percentage of total stock count as low stock
pub const LOW_STOCK_PERCENT: f64 = 20.0;

/// Availability band of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StockLevel {
    Red,
    Orange,
    Green,
}

impl StockLevel {
    /// Band for a percent-available value. NaN compares false everywhere and
    /// lands in `Green`.
    pub fn classify(percent: f64) -> Self {
        if percent < 20.0 {
            StockLevel::Red
        } else if percent < 50.0 {
            StockLevel::Orange
        } else {
            StockLevel::Green
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            StockLevel::Red => "stock-red",
            StockLevel::Orange => "stock-orange",
            StockLevel::Green => "stock-green",
        }
    }
}

/// `available / total * 100`, unguarded: zero total yields NaN or infinity
pub fn percent_available(available: i64, total: i64) -> f64 {
    available as f64 / total as f64 * 100.0
}

/// Non-finite floats serialize as `null`
fn serialize_percent<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

/// Group digits with `.` separators, e.g. 1500000 -> "1.500.000"
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }

    if negative {
        format!("-{}", out)
    } else {
        out
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemLine {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub total_stock: i64,
    pub available_stock: i64,
    pub unit: String,
    pub brand: Option<String>,
    pub unit_price: Option<f64>,
    #[serde(serialize_with = "serialize_percent")]
    pub percent_available: f64,
    pub level: StockLevel,
}

impl ItemLine {
    fn from_item(item: &StationeryItem) -> Self {
        let percent = percent_available(item.available_stock, item.total_stock);
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            category: item.category,
            total_stock: item.total_stock,
            available_stock: item.available_stock,
            unit: item.unit.clone(),
            brand: item.brand.clone(),
            unit_price: item.unit_price,
            percent_available: percent,
            level: StockLevel::classify(percent),
        }
    }

    /// One decimal place; non-finite values print as-is ("NaN%", "inf%")
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.percent_available)
    }

    pub fn brand_label(&self) -> &str {
        self.brand.as_deref().unwrap_or("-")
    }

    pub fn unit_price_label(&self) -> String {
        match self.unit_price {
            Some(price) => format!("Rp {}", group_thousands(price)),
            None => "-".to_string(),
        }
    }

    pub fn is_low_stock(&self) -> bool {
        (self.available_stock as f64) < (self.total_stock as f64) * LOW_STOCK_PERCENT / 100.0
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category: Category,
    pub item_count: usize,
    pub available_stock: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub total_items: usize,
    pub total_available_stock: i64,
    pub low_stock_items: usize,
    pub categories: Vec<CategoryBreakdown>,
    pub items: Vec<ItemLine>,
}

impl StockReport {
    pub fn build(items: &[StationeryItem], generated_at: DateTime<Utc>) -> Self {
        let lines: Vec<ItemLine> = items.iter().map(ItemLine::from_item).collect();

        let categories = Category::ALL
            .iter()
            .map(|&category| {
                let in_category = lines.iter().filter(|l| l.category == category);
                CategoryBreakdown {
                    category,
                    item_count: in_category.clone().count(),
                    available_stock: in_category.map(|l| l.available_stock).sum(),
                }
            })
            .collect();

        Self {
            title: report_title(generated_at),
            generated_at,
            total_items: lines.len(),
            total_available_stock: lines.iter().map(|l| l.available_stock).sum(),
            low_stock_items: lines.iter().filter(|l| l.is_low_stock()).count(),
            categories,
            items: lines,
        }
    }

    pub fn items_in(&self, category: Category) -> Vec<&ItemLine> {
        self.items.iter().filter(|l| l.category == category).collect()
    }

    pub fn generated_label(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M UTC").to_string()
    }
}

/// "Stock-Report-YYYY-MM-DD"
pub fn report_title(at: DateTime<Utc>) -> String {
    format!("Stock-Report-{}", at.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn item(name: &str, category: Category, total: i64, available: i64) -> StationeryItem {
        StationeryItem {
            id: format!("id-{}", name),
            name: name.to_string(),
            category,
            total_stock: total,
            available_stock: available,
            unit: "pcs".to_string(),
            brand: None,
            unit_price: None,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 17, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_classification_thresholds() {
        let report = StockReport::build(
            &[
                item("A", Category::OpStock, 100, 19),
                item("B", Category::OpStock, 100, 20),
                item("C", Category::OpStock, 100, 50),
            ],
            at(),
        );

        assert_eq!(report.items[0].percent_label(), "19.0%");
        assert_eq!(report.items[0].level, StockLevel::Red);
        assert_eq!(report.items[1].percent_label(), "20.0%");
        assert_eq!(report.items[1].level, StockLevel::Orange);
        assert_eq!(report.items[2].level, StockLevel::Green);
        assert_eq!(report.low_stock_items, 1);
    }

    #[test]
    fn test_zero_total_is_unguarded() {
        let report = StockReport::build(
            &[
                item("Empty", Category::OpStock, 0, 0),
                item("Odd", Category::OpNonStock, 0, 3),
            ],
            at(),
        );

        assert!(report.items[0].percent_available.is_nan());
        assert_eq!(report.items[0].percent_label(), "NaN%");
        assert_eq!(report.items[0].level, StockLevel::Green);
        assert_eq!(report.items[1].percent_label(), "inf%");

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["items"][0]["percentAvailable"].is_null());
    }

    #[test]
    fn test_totals_and_category_breakdown() {
        let report = StockReport::build(
            &[
                item("Pen", Category::OpStock, 50, 40),
                item("Stapler", Category::OpStock, 10, 1),
                item("Toner", Category::OpNonStock, 4, 2),
            ],
            at(),
        );

        assert_eq!(report.title, "Stock-Report-2026-05-17");
        assert_eq!(report.total_items, 3);
        assert_eq!(report.total_available_stock, 43);
        assert_eq!(report.categories[0].category, Category::OpStock);
        assert_eq!(report.categories[0].item_count, 2);
        assert_eq!(report.categories[0].available_stock, 41);
        assert_eq!(report.categories[1].item_count, 1);
        assert_eq!(report.items_in(Category::OpNonStock).len(), 1);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1500.0), "1.500");
        assert_eq!(group_thousands(1234567.4), "1.234.567");
    }

    #[test]
    fn test_unit_price_label() {
        let mut pen = item("Pen", Category::OpNonStock, 1, 1);
        assert_eq!(ItemLine::from_item(&pen).unit_price_label(), "-");
        pen.unit_price = Some(25000.0);
        assert_eq!(ItemLine::from_item(&pen).unit_price_label(), "Rp 25.000");
    }
}
