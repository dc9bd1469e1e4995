use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{store_timestamp, InventoryStore, StoreError};
use crate::db::{
    MissingReport, NewMissingReport, NewRetrievalOrder, NewSession, NewStationeryItem, NewUser,
    OrderStatus, RetrievalOrder, StationeryItem, User, UserRecord,
};

#[derive(Debug, Default)]
struct Tables {
    items: Vec<StationeryItem>,
    // Insertion order doubles as the rowid tie-breaker for equal dates
    orders: Vec<RetrievalOrder>,
    missing_reports: Vec<MissingReport>,
    users: Vec<UserRecord>,
    sessions: HashMap<String, (String, String)>,
}

/// In-process `InventoryStore` with the same defaults and constraints as the
/// SQLite schema. Used by tests and by tooling that needs a throwaway store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> String {
        store_timestamp(chrono::Utc::now())
    }
}

fn newest_first<T>(rows: &[T], date: impl Fn(&T) -> &str) -> Vec<T>
where
    T: Clone,
{
    let mut indexed: Vec<(usize, &T)> = rows.iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| date(b).cmp(date(a)).then(ib.cmp(ia)));
    indexed.into_iter().map(|(_, row)| row.clone()).collect()
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn list_items(&self) -> Result<Vec<StationeryItem>, StoreError> {
        let mut items = self.tables.read().items.clone();
        items.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(items)
    }

    async fn insert_item(&self, item: &NewStationeryItem) -> Result<String, StoreError> {
        if item.total_stock < 0 || item.available_stock < 0 || item.available_stock > item.total_stock {
            return Err(StoreError::Constraint("stationery_items stock".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        self.tables.write().items.push(StationeryItem {
            id: id.clone(),
            name: item.name.clone(),
            category: item.category,
            total_stock: item.total_stock,
            available_stock: item.available_stock,
            unit: item.unit.clone(),
            brand: item.brand.clone(),
            unit_price: item.unit_price,
        });
        Ok(id)
    }

    async fn update_available_stock(&self, id: &str, available_stock: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let item = tables
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound)?;

        if available_stock < 0 || available_stock > item.total_stock {
            return Err(StoreError::Constraint("stationery_items stock".to_string()));
        }
        item.available_stock = available_stock;
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if !tables.items.iter().any(|i| i.id == id) {
            return Err(StoreError::NotFound);
        }

        let referenced = tables.orders.iter().any(|o| o.item_id == id)
            || tables.missing_reports.iter().any(|r| r.item_id == id);
        if referenced {
            return Err(StoreError::ForeignKey);
        }

        tables.items.retain(|i| i.id != id);
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<RetrievalOrder>, StoreError> {
        let tables = self.tables.read();
        Ok(newest_first(&tables.orders, |o| o.date.as_str()))
    }

    async fn insert_order(&self, order: &NewRetrievalOrder) -> Result<String, StoreError> {
        let mut tables = self.tables.write();
        if !tables.items.iter().any(|i| i.id == order.item_id) {
            return Err(StoreError::ForeignKey);
        }
        if order.quantity <= 0 {
            return Err(StoreError::Constraint("retrieval_orders quantity".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        tables.orders.push(RetrievalOrder {
            id: id.clone(),
            order_type: order.order_type,
            user_email: order.user_email.clone(),
            item_id: order.item_id.clone(),
            item_name: order.item_name.clone(),
            quantity: order.quantity,
            notes: Some(order.notes.clone()),
            date: Self::now(),
            status: OrderStatus::Pending,
        });
        Ok(id)
    }

    async fn list_missing_reports(&self) -> Result<Vec<MissingReport>, StoreError> {
        let tables = self.tables.read();
        Ok(newest_first(&tables.missing_reports, |r| r.date.as_str()))
    }

    async fn insert_missing_report(&self, report: &NewMissingReport) -> Result<String, StoreError> {
        let mut tables = self.tables.write();
        if !tables.items.iter().any(|i| i.id == report.item_id) {
            return Err(StoreError::ForeignKey);
        }
        if report.quantity <= 0 {
            return Err(StoreError::Constraint("missing_reports quantity".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        tables.missing_reports.push(MissingReport {
            id: id.clone(),
            item_id: report.item_id.clone(),
            item_name: report.item_name.clone(),
            reported_by: report.reported_by.clone(),
            quantity: report.quantity,
            notes: Some(report.notes.clone()),
            date: Self::now(),
        });
        Ok(id)
    }

    async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.read();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut users = self.tables.read().users.clone();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn insert_user(&self, user: &NewUser) -> Result<String, StoreError> {
        let mut tables = self.tables.write();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict);
        }

        let id = Uuid::new_v4().to_string();
        tables.users.push(UserRecord {
            id: id.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.as_str().to_string(),
            created_at: Self::now(),
        });
        Ok(id)
    }

    async fn insert_session(&self, session: &NewSession) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if tables.sessions.contains_key(&session.token_hash) {
            return Err(StoreError::Conflict);
        }
        tables.sessions.insert(
            session.token_hash.clone(),
            (session.user_id.clone(), session.expires_at.clone()),
        );
        Ok(())
    }

    async fn find_session_user(&self, token_hash: &str, now: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read();
        let user = tables
            .sessions
            .get(token_hash)
            .filter(|(_, expires_at)| expires_at.as_str() > now)
            .and_then(|(user_id, _)| tables.users.iter().find(|u| &u.id == user_id))
            .cloned()
            .map(User::from);
        Ok(user)
    }

    async fn delete_session(&self, token_hash: &str) -> Result<(), StoreError> {
        self.tables.write().sessions.remove(token_hash);
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: &str) -> Result<u64, StoreError> {
        let mut tables = self.tables.write();
        let before = tables.sessions.len();
        tables
            .sessions
            .retain(|_, (_, expires_at)| expires_at.as_str() > now);
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Category, NewSession, OrderType};

    fn item(name: &str) -> NewStationeryItem {
        NewStationeryItem {
            name: name.to_string(),
            category: Category::OpStock,
            total_stock: 10,
            available_stock: 5,
            unit: "pcs".to_string(),
            brand: None,
            unit_price: None,
        }
    }

    #[tokio::test]
    async fn test_orders_newest_first_with_insertion_tiebreak() {
        let store = MemoryStore::new();
        let item_id = store.insert_item(&item("Pen")).await.unwrap();

        let mut ids = Vec::new();
        for quantity in 1..=3 {
            let id = store
                .insert_order(&NewRetrievalOrder {
                    order_type: OrderType::Retrieval,
                    user_email: "a@campus.ac.id".to_string(),
                    item_id: item_id.clone(),
                    item_name: "Pen".to_string(),
                    quantity,
                    notes: "class".to_string(),
                })
                .await
                .unwrap();
            ids.push(id);
        }

        let listed: Vec<String> = store
            .list_orders()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_delete_referenced_item_is_in_use() {
        let store = MemoryStore::new();
        let item_id = store.insert_item(&item("Pen")).await.unwrap();
        store
            .insert_missing_report(&NewMissingReport {
                item_id: item_id.clone(),
                item_name: "Pen".to_string(),
                reported_by: "staff@campus.ac.id".to_string(),
                quantity: 2,
                notes: "gone".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(
            store.delete_item(&item_id).await,
            Err(StoreError::ForeignKey)
        ));
    }

    #[tokio::test]
    async fn test_stock_constraint_mirrors_schema() {
        let store = MemoryStore::new();
        let item_id = store.insert_item(&item("Pen")).await.unwrap();
        assert!(matches!(
            store.update_available_stock(&item_id, 11).await,
            Err(StoreError::Constraint(_))
        ));
        store.update_available_stock(&item_id, 10).await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_keeps_live_sessions() {
        let store = MemoryStore::new();
        for (token_hash, expires_at) in [
            ("old", "2026-01-01T00:00:00.000Z"),
            ("live", "2026-01-03T00:00:00.000Z"),
        ] {
            store
                .insert_session(&NewSession {
                    user_id: "u1".to_string(),
                    token_hash: token_hash.to_string(),
                    expires_at: expires_at.to_string(),
                })
                .await
                .unwrap();
        }

        assert_eq!(
            store
                .purge_expired_sessions("2026-01-02T00:00:00.000Z")
                .await
                .unwrap(),
            1
        );
        let tables = store.tables.read();
        assert!(tables.sessions.contains_key("live"));
        assert!(!tables.sessions.contains_key("old"));
    }
}
