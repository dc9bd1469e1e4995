//! Input validation for inventory submissions.
//!
//! Every check runs before the store is touched. A submission is accepted or
//! rejected as a whole; the first failing rule is reported.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::db::{
    CreateItemRequest, CreateMissingReportRequest, CreateOrderRequest, NewMissingReport,
    NewRetrievalOrder, NewStationeryItem, OrderType, StationeryItem, User,
};

lazy_static! {
    /// Loose email shape check: something@something.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// A rejected submission, tied to the offending field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Convert a submitted number into a whole count.
///
/// Returns `None` for NaN, infinities and fractional values.
fn whole_number(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Validate the add-item form
pub fn validate_new_item(req: &CreateItemRequest) -> Result<NewStationeryItem, ValidationError> {
    let name = req.name.trim();
    let unit = req.unit.trim();

    if name.is_empty() || unit.is_empty() {
        let field = if name.is_empty() { "name" } else { "unit" };
        return Err(ValidationError::new(field, "Item name and unit are required"));
    }

    let total_stock = whole_number(req.total_stock)
        .ok_or_else(|| ValidationError::new("totalStock", "Total stock must be a whole number"))?;
    let available_stock = whole_number(req.available_stock).ok_or_else(|| {
        ValidationError::new("availableStock", "Available stock must be a whole number")
    })?;

    if total_stock < 0 {
        return Err(ValidationError::new("totalStock", "Total stock cannot be negative"));
    }
    if available_stock < 0 {
        return Err(ValidationError::new(
            "availableStock",
            "Available stock cannot be negative",
        ));
    }
    if available_stock > total_stock {
        return Err(ValidationError::new(
            "availableStock",
            "Available stock cannot exceed total stock",
        ));
    }

    if let Some(price) = req.unit_price {
        if !price.is_finite() || price < 0.0 {
            return Err(ValidationError::new("unitPrice", "Unit price cannot be negative"));
        }
    }

    let brand = req
        .brand
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string);

    Ok(NewStationeryItem {
        name: name.to_string(),
        category: req.category,
        total_stock,
        available_stock,
        unit: unit.to_string(),
        brand,
        unit_price: req.unit_price,
    })
}

/// Validate an inline edit of an item's available stock
pub fn validate_stock_edit(item: &StationeryItem, value: f64) -> Result<i64, ValidationError> {
    let new_stock = match whole_number(value) {
        Some(v) if v >= 0 => v,
        _ => {
            return Err(ValidationError::new(
                "availableStock",
                "Please enter a valid positive number",
            ))
        }
    };

    if new_stock > item.total_stock {
        return Err(ValidationError::new(
            "availableStock",
            format!(
                "Available stock cannot exceed total stock ({})",
                item.total_stock
            ),
        ));
    }

    Ok(new_stock)
}

/// Look up the selected item in the last-fetched item list
fn selected_item<'a>(
    items: &'a [StationeryItem],
    item_id: &str,
) -> Result<&'a StationeryItem, ValidationError> {
    let item_id = item_id.trim();
    if item_id.is_empty() {
        return Err(ValidationError::new("itemId", "Please select a stationery item"));
    }

    items
        .iter()
        .find(|i| i.id == item_id)
        .ok_or_else(|| ValidationError::new("itemId", "Please select a stationery item"))
}

fn positive_quantity(quantity: Option<f64>) -> Result<i64, ValidationError> {
    match quantity.and_then(whole_number) {
        Some(q) if q > 0 => Ok(q),
        _ => Err(ValidationError::new("quantity", "Please enter a valid quantity")),
    }
}

fn required_notes(notes: &str, message: impl Into<String>) -> Result<String, ValidationError> {
    let notes = notes.trim();
    if notes.is_empty() {
        return Err(ValidationError::new("notes", message));
    }
    Ok(notes.to_string())
}

/// Validate a retrieval or order submission against the item snapshot.
///
/// Retrievals may not ask for more than the snapshot's available stock.
/// Orders request new procurement and are not bounded.
pub fn validate_order(
    req: &CreateOrderRequest,
    user: &User,
    items: &[StationeryItem],
) -> Result<NewRetrievalOrder, ValidationError> {
    let item = selected_item(items, &req.item_id)?;
    let quantity = positive_quantity(req.quantity)?;
    let notes = required_notes(
        &req.notes,
        format!("Please provide notes for this {}", req.order_type),
    )?;

    if req.order_type == OrderType::Retrieval && quantity > item.available_stock {
        return Err(ValidationError::new(
            "quantity",
            format!(
                "Only {} {} available. Cannot retrieve {} {}.",
                item.available_stock, item.unit, quantity, item.unit
            ),
        ));
    }

    Ok(NewRetrievalOrder {
        order_type: req.order_type,
        user_email: user.email.clone(),
        item_id: item.id.clone(),
        item_name: item.name.clone(),
        quantity,
        notes,
    })
}

/// Validate a missing item report
pub fn validate_missing_report(
    req: &CreateMissingReportRequest,
    user: &User,
    items: &[StationeryItem],
) -> Result<NewMissingReport, ValidationError> {
    let item = selected_item(items, &req.item_id)?;
    let quantity = positive_quantity(req.quantity)?;
    let notes = required_notes(&req.notes, "Please provide notes about the missing item")?;

    Ok(NewMissingReport {
        item_id: item.id.clone(),
        item_name: item.name.clone(),
        reported_by: user.email.clone(),
        quantity,
        notes,
    })
}

/// Validate an email address used as a login identifier
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::new("email", "Email is required"));
    }
    if email.len() > 254 {
        return Err(ValidationError::new(
            "email",
            "Email is too long (max 254 characters)",
        ));
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::new("email", "Invalid email address"));
    }
    Ok(())
}
