//! Inventory controller.
//!
//! `Inventory` owns the application's view of the store: the last fetched
//! item, order and missing report collections. Every mutation validates
//! against that snapshot, writes through the store, then refetches the
//! affected collections in full and swaps them in. There are no partial
//! merges and no optimistic updates.

pub mod validation;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::{
    CreateItemRequest, CreateMissingReportRequest, CreateOrderRequest, MissingReport,
    RetrievalOrder, StationeryItem, User,
};
use crate::report::StockReport;
use crate::store::{InventoryStore, StoreError};

pub use validation::ValidationError;

/// How many missing reports the staff view shows
pub const RECENT_MISSING_REPORTS: usize = 5;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("stationery item {0} not found")]
    ItemNotFound(String),

    /// The item is referenced by orders or missing reports
    #[error("Cannot delete this item because it is already used in orders or reports.")]
    ItemInUse,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Collections as of the last successful fetch
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub items: Vec<StationeryItem>,
    pub orders: Vec<RetrievalOrder>,
    pub missing_reports: Vec<MissingReport>,
    pub fetched_at: DateTime<Utc>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            orders: Vec::new(),
            missing_reports: Vec::new(),
            fetched_at: DateTime::<Utc>::default(),
        }
    }
}

impl Snapshot {
    pub fn item(&self, id: &str) -> Option<&StationeryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn orders_for(&self, email: &str) -> Vec<RetrievalOrder> {
        self.orders
            .iter()
            .filter(|o| o.user_email == email)
            .cloned()
            .collect()
    }

    /// Most recent missing reports, newest first
    pub fn recent_missing_reports(&self, limit: usize) -> Vec<MissingReport> {
        let mut reports = self.missing_reports.clone();
        reports.sort_by(|a, b| b.date.cmp(&a.date));
        reports.truncate(limit);
        reports
    }
}

pub struct Inventory {
    store: Arc<dyn InventoryStore>,
    snapshot: ArcSwap<Snapshot>,
}

impl Inventory {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            store,
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
        }
    }

    /// Create the controller and perform the initial full load
    pub async fn load(store: Arc<dyn InventoryStore>) -> Result<Self, InventoryError> {
        let inventory = Self::new(store);
        inventory.refresh_all().await?;
        Ok(inventory)
    }

    pub fn store(&self) -> &Arc<dyn InventoryStore> {
        &self.store
    }

    /// Current snapshot. Cheap; the returned value never changes underneath
    /// the caller.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    pub async fn refresh_all(&self) -> Result<(), InventoryError> {
        let (items, orders, missing_reports) = tokio::try_join!(
            self.store.list_items(),
            self.store.list_orders(),
            self.store.list_missing_reports(),
        )?;

        self.snapshot.store(Arc::new(Snapshot {
            items,
            orders,
            missing_reports,
            fetched_at: Utc::now(),
        }));
        Ok(())
    }

    async fn refresh_items(&self) -> Result<(), InventoryError> {
        let items = self.store.list_items().await?;
        self.swap(|next| next.items = items.clone());
        Ok(())
    }

    async fn refresh_orders_and_items(&self) -> Result<(), InventoryError> {
        let (orders, items) = tokio::try_join!(self.store.list_orders(), self.store.list_items())?;
        self.swap(|next| {
            next.orders = orders.clone();
            next.items = items.clone();
        });
        Ok(())
    }

    async fn refresh_missing_reports(&self) -> Result<(), InventoryError> {
        let missing_reports = self.store.list_missing_reports().await?;
        self.swap(|next| next.missing_reports = missing_reports.clone());
        Ok(())
    }

    /// Replace part of the snapshot. The closure may run more than once when
    /// another refresh lands concurrently.
    fn swap(&self, apply: impl Fn(&mut Snapshot)) {
        self.snapshot.rcu(|current| {
            let mut next = Snapshot::clone(current);
            apply(&mut next);
            next.fetched_at = Utc::now();
            next
        });
    }

    /// Add a stationery item (add-item form)
    pub async fn add_item(&self, req: CreateItemRequest) -> Result<StationeryItem, InventoryError> {
        let new_item = validation::validate_new_item(&req).map_err(|e| {
            warn!(field = e.field, reason = %e, "Rejected new stationery item");
            e
        })?;

        let id = self.store.insert_item(&new_item).await?;
        self.refresh_items().await?;

        info!(
            item_id = %id,
            name = %new_item.name,
            category = %new_item.category,
            "Stationery item added"
        );

        self.snapshot()
            .item(&id)
            .cloned()
            .ok_or(InventoryError::ItemNotFound(id))
    }

    /// Set an item's available stock (inline stock edit)
    pub async fn update_available_stock(
        &self,
        item_id: &str,
        value: f64,
    ) -> Result<StationeryItem, InventoryError> {
        let snapshot = self.snapshot();
        let item = snapshot
            .item(item_id)
            .ok_or_else(|| InventoryError::ItemNotFound(item_id.to_string()))?;

        let new_stock = validation::validate_stock_edit(item, value).map_err(|e| {
            warn!(item_id = %item_id, reason = %e, "Rejected stock edit");
            e
        })?;

        self.store.update_available_stock(item_id, new_stock).await?;
        self.refresh_items().await?;

        info!(
            item_id = %item_id,
            name = %item.name,
            available_stock = new_stock,
            unit = %item.unit,
            "Stock updated"
        );

        self.snapshot()
            .item(item_id)
            .cloned()
            .ok_or_else(|| InventoryError::ItemNotFound(item_id.to_string()))
    }

    /// Remove an item. Fails with `ItemInUse` while orders or reports point at it.
    pub async fn delete_item(&self, item_id: &str) -> Result<(), InventoryError> {
        match self.store.delete_item(item_id).await {
            Ok(()) => {}
            Err(StoreError::ForeignKey) => {
                warn!(item_id = %item_id, "Refused to delete referenced item");
                return Err(InventoryError::ItemInUse);
            }
            Err(StoreError::NotFound) => {
                return Err(InventoryError::ItemNotFound(item_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        self.refresh_items().await?;
        info!(item_id = %item_id, "Stationery item deleted");
        Ok(())
    }

    /// Submit a retrieval or order request on behalf of `user`.
    ///
    /// The retrieval stock check reads the snapshot, not the store, so two
    /// concurrent retrievals of the same item can both pass it.
    pub async fn submit_order(
        &self,
        user: &User,
        req: CreateOrderRequest,
    ) -> Result<RetrievalOrder, InventoryError> {
        let snapshot = self.snapshot();
        let new_order = validation::validate_order(&req, user, &snapshot.items).map_err(|e| {
            warn!(user = %user.email, kind = %req.order_type, field = e.field, reason = %e, "Rejected request");
            e
        })?;

        let id = self.store.insert_order(&new_order).await?;
        self.refresh_orders_and_items().await?;

        info!(
            order_id = %id,
            user = %user.email,
            kind = %new_order.order_type,
            item_id = %new_order.item_id,
            quantity = new_order.quantity,
            "Request submitted"
        );

        self.snapshot()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or(InventoryError::Store(StoreError::NotFound))
    }

    /// Append a missing item report. Stock counts are not touched.
    pub async fn report_missing(
        &self,
        user: &User,
        req: CreateMissingReportRequest,
    ) -> Result<MissingReport, InventoryError> {
        let snapshot = self.snapshot();
        let new_report =
            validation::validate_missing_report(&req, user, &snapshot.items).map_err(|e| {
                warn!(user = %user.email, field = e.field, reason = %e, "Rejected missing report");
                e
            })?;

        let id = self.store.insert_missing_report(&new_report).await?;
        self.refresh_missing_reports().await?;

        info!(
            report_id = %id,
            user = %user.email,
            item_id = %new_report.item_id,
            quantity = new_report.quantity,
            "Missing item reported"
        );

        self.snapshot()
            .missing_reports
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(InventoryError::Store(StoreError::NotFound))
    }

    /// Stock report over the current item snapshot
    pub fn stock_report(&self, generated_at: DateTime<Utc>) -> StockReport {
        StockReport::build(&self.snapshot().items, generated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Category, OrderStatus, OrderType, Role};
    use crate::store::MemoryStore;

    fn staff() -> User {
        User {
            email: "staff@campus.ac.id".to_string(),
            role: Role::Staff,
        }
    }

    fn lecturer() -> User {
        User {
            email: "lecturer@campus.ac.id".to_string(),
            role: Role::Lecturer,
        }
    }

    fn item_request(name: &str, category: Category, total: f64, available: f64) -> CreateItemRequest {
        CreateItemRequest {
            name: name.to_string(),
            category,
            total_stock: total,
            available_stock: available,
            unit: "pcs".to_string(),
            brand: None,
            unit_price: None,
        }
    }

    async fn inventory() -> Inventory {
        Inventory::load(Arc::new(MemoryStore::new())).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_item_appears_sorted_in_category() {
        let inventory = inventory().await;
        inventory
            .add_item(item_request("Whiteboard Marker", Category::OpStock, 20.0, 20.0))
            .await
            .unwrap();
        inventory
            .add_item(item_request("Envelope", Category::OpNonStock, 5.0, 5.0))
            .await
            .unwrap();
        let stapler = inventory
            .add_item(item_request("Stapler", Category::OpStock, 10.0, 10.0))
            .await
            .unwrap();

        assert_eq!(stapler.available_stock, 10);

        let op_stock: Vec<String> = inventory
            .snapshot()
            .items
            .iter()
            .filter(|i| i.category == Category::OpStock)
            .map(|i| i.name.clone())
            .collect();
        assert_eq!(op_stock, vec!["Stapler", "Whiteboard Marker"]);
    }

    #[tokio::test]
    async fn test_invalid_item_does_not_reach_store() {
        let inventory = inventory().await;
        let err = inventory
            .add_item(item_request("Stapler", Category::OpStock, 10.0, 11.0))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert!(inventory.store().list_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_retrieval_leaves_state_unchanged() {
        let inventory = inventory().await;
        let item = inventory
            .add_item(item_request("Glue Stick", Category::OpStock, 10.0, 5.0))
            .await
            .unwrap();

        let err = inventory
            .submit_order(
                &lecturer(),
                CreateOrderRequest {
                    order_type: OrderType::Retrieval,
                    item_id: item.id.clone(),
                    quantity: Some(6.0),
                    notes: "Workshop".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));

        assert!(inventory.store().list_orders().await.unwrap().is_empty());
        assert_eq!(inventory.snapshot().item(&item.id).unwrap().available_stock, 5);
    }

    #[tokio::test]
    async fn test_accepted_retrieval_does_not_deduct_stock() {
        let inventory = inventory().await;
        let item = inventory
            .add_item(item_request("Glue Stick", Category::OpStock, 10.0, 5.0))
            .await
            .unwrap();

        let order = inventory
            .submit_order(
                &lecturer(),
                CreateOrderRequest {
                    order_type: OrderType::Retrieval,
                    item_id: item.id.clone(),
                    quantity: Some(5.0),
                    notes: " Workshop ".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.notes.as_deref(), Some("Workshop"));
        assert_eq!(order.item_name, "Glue Stick");

        let snapshot = inventory.snapshot();
        assert_eq!(snapshot.orders_for("lecturer@campus.ac.id").len(), 1);
        assert!(snapshot.orders_for("someone@campus.ac.id").is_empty());
        assert_eq!(snapshot.item(&item.id).unwrap().available_stock, 5);
    }

    #[tokio::test]
    async fn test_missing_report_is_first_of_recent() {
        let inventory = inventory().await;
        let item = inventory
            .add_item(item_request("Scissors", Category::OpStock, 8.0, 8.0))
            .await
            .unwrap();

        for n in 1..=6 {
            inventory
                .report_missing(
                    &staff(),
                    CreateMissingReportRequest {
                        item_id: item.id.clone(),
                        quantity: Some(1.0),
                        notes: format!("check {}", n),
                    },
                )
                .await
                .unwrap();
        }

        let report = inventory
            .report_missing(
                &staff(),
                CreateMissingReportRequest {
                    item_id: item.id.clone(),
                    quantity: Some(2.0),
                    notes: "found empty box".to_string(),
                },
            )
            .await
            .unwrap();

        let recent = inventory
            .snapshot()
            .recent_missing_reports(RECENT_MISSING_REPORTS);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].id, report.id);
        assert_eq!(recent[0].notes.as_deref(), Some("found empty box"));

        // Reports never touch stock
        assert_eq!(inventory.snapshot().item(&item.id).unwrap().available_stock, 8);
    }

    #[tokio::test]
    async fn test_stock_edit_refetches_exact_state() {
        let inventory = inventory().await;
        let item = inventory
            .add_item(item_request("Stapler", Category::OpStock, 10.0, 10.0))
            .await
            .unwrap();

        let updated = inventory.update_available_stock(&item.id, 3.0).await.unwrap();
        assert_eq!(updated.available_stock, 3);
        assert_eq!(
            inventory.store().list_items().await.unwrap()[0].available_stock,
            3
        );

        let err = inventory
            .update_available_stock(&item.id, 11.0)
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert_eq!(inventory.snapshot().item(&item.id).unwrap().available_stock, 3);
    }

    #[tokio::test]
    async fn test_stock_edit_unknown_item() {
        let inventory = inventory().await;
        let err = inventory.update_available_stock("nope", 1.0).await.unwrap_err();
        assert!(matches!(err, InventoryError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_referenced_item_is_refused() {
        let inventory = inventory().await;
        let item = inventory
            .add_item(item_request("Stapler", Category::OpStock, 10.0, 10.0))
            .await
            .unwrap();
        inventory
            .submit_order(
                &lecturer(),
                CreateOrderRequest {
                    order_type: OrderType::Order,
                    item_id: item.id.clone(),
                    quantity: Some(2.0),
                    notes: "restock".to_string(),
                },
            )
            .await
            .unwrap();

        let err = inventory.delete_item(&item.id).await.unwrap_err();
        assert!(matches!(err, InventoryError::ItemInUse));
        assert_eq!(inventory.snapshot().items.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unreferenced_item() {
        let inventory = inventory().await;
        let item = inventory
            .add_item(item_request("Stapler", Category::OpStock, 10.0, 10.0))
            .await
            .unwrap();
        inventory.delete_item(&item.id).await.unwrap();
        assert!(inventory.snapshot().items.is_empty());
    }
}
