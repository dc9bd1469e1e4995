use async_trait::async_trait;
use uuid::Uuid;

use super::{InventoryStore, StoreError};
use crate::db::{
    DbPool, MissingReport, MissingReportRow, NewMissingReport, NewRetrievalOrder, NewSession,
    NewStationeryItem, NewUser, RetrievalOrder, RetrievalOrderRow, StationeryItem,
    StationeryItemRow, User, UserRecord,
};

/// `InventoryStore` backed by the SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for SqliteStore {
    async fn list_items(&self) -> Result<Vec<StationeryItem>, StoreError> {
        let rows = sqlx::query_as::<_, StationeryItemRow>(
            r#"
            SELECT id, name, category, total_stock, available_stock, unit, brand, unit_price
            FROM stationery_items
            ORDER BY name COLLATE NOCASE ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StationeryItem::from).collect())
    }

    async fn insert_item(&self, item: &NewStationeryItem) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO stationery_items (id, name, category, total_stock, available_stock, unit, brand, unit_price)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&item.name)
        .bind(item.category.as_str())
        .bind(item.total_stock)
        .bind(item.available_stock)
        .bind(&item.unit)
        .bind(&item.brand)
        .bind(item.unit_price)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_available_stock(&self, id: &str, available_stock: i64) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE stationery_items SET available_stock = ? WHERE id = ?")
            .bind(available_stock)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM stationery_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<RetrievalOrder>, StoreError> {
        let rows = sqlx::query_as::<_, RetrievalOrderRow>(
            r#"
            SELECT id, type, user_email, item_id, item_name, quantity, notes, date, status
            FROM retrieval_orders
            ORDER BY date DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RetrievalOrder::from).collect())
    }

    async fn insert_order(&self, order: &NewRetrievalOrder) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();

        // date and status use the column defaults
        sqlx::query(
            r#"
            INSERT INTO retrieval_orders (id, type, user_email, item_id, item_name, quantity, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(order.order_type.as_str())
        .bind(&order.user_email)
        .bind(&order.item_id)
        .bind(&order.item_name)
        .bind(order.quantity)
        .bind(&order.notes)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_missing_reports(&self) -> Result<Vec<MissingReport>, StoreError> {
        let rows = sqlx::query_as::<_, MissingReportRow>(
            r#"
            SELECT id, item_id, item_name, reported_by, quantity, notes, date
            FROM missing_reports
            ORDER BY date DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MissingReport::from).collect())
    }

    async fn insert_missing_report(&self, report: &NewMissingReport) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO missing_reports (id, item_id, item_name, reported_by, quantity, notes)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&report.item_id)
        .bind(&report.item_name)
        .bind(&report.reported_by)
        .bind(report.quantity)
        .bind(&report.notes)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let users = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password_hash, role, created_at FROM users ORDER BY email ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn insert_user(&self, user: &NewUser) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO users (id, email, password_hash, role) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    async fn insert_session(&self, session: &NewSession) -> Result<(), StoreError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&session.user_id)
        .bind(&session.token_hash)
        .bind(&session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session_user(&self, token_hash: &str, now: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.role, u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = ? AND s.expires_at > ?
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user.map(User::from))
    }

    async fn delete_session(&self, token_hash: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_in_memory, Category, OrderStatus, OrderType, Role};

    async fn store() -> SqliteStore {
        SqliteStore::new(init_in_memory().await.unwrap())
    }

    fn item(name: &str, total: i64, available: i64) -> NewStationeryItem {
        NewStationeryItem {
            name: name.to_string(),
            category: Category::OpStock,
            total_stock: total,
            available_stock: available,
            unit: "pcs".to_string(),
            brand: None,
            unit_price: None,
        }
    }

    #[tokio::test]
    async fn test_items_listed_by_name() {
        let store = store().await;
        store.insert_item(&item("stapler", 10, 10)).await.unwrap();
        store.insert_item(&item("Binder Clip", 5, 2)).await.unwrap();
        store.insert_item(&item("A4 Paper", 100, 40)).await.unwrap();

        let names: Vec<String> = store
            .list_items()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["A4 Paper", "Binder Clip", "stapler"]);
    }

    #[tokio::test]
    async fn test_item_columns_round_trip() {
        let store = store().await;
        let mut new_item = item("Marker", 12, 7);
        new_item.category = Category::OpNonStock;
        new_item.brand = Some("Snowman".to_string());
        new_item.unit_price = Some(12500.0);
        let id = store.insert_item(&new_item).await.unwrap();

        let items = store.list_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, id);
        assert_eq!(items[0].category, Category::OpNonStock);
        assert_eq!(items[0].total_stock, 12);
        assert_eq!(items[0].available_stock, 7);
        assert_eq!(items[0].brand.as_deref(), Some("Snowman"));
        assert_eq!(items[0].unit_price, Some(12500.0));
    }

    #[tokio::test]
    async fn test_update_stock_is_visible_on_refetch() {
        let store = store().await;
        let id = store.insert_item(&item("Stapler", 10, 10)).await.unwrap();

        store.update_available_stock(&id, 4).await.unwrap();

        let items = store.list_items().await.unwrap();
        assert_eq!(items[0].available_stock, 4);
    }

    #[tokio::test]
    async fn test_update_missing_item_is_not_found() {
        let store = store().await;
        let err = store.update_available_stock("missing", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_check_constraint_backstops_available_over_total() {
        let store = store().await;
        let id = store.insert_item(&item("Stapler", 10, 10)).await.unwrap();
        let err = store.update_available_stock(&id, 11).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_order_gets_store_defaults() {
        let store = store().await;
        let item_id = store.insert_item(&item("Stapler", 10, 10)).await.unwrap();

        let id = store
            .insert_order(&NewRetrievalOrder {
                order_type: OrderType::Order,
                user_email: "lecturer@campus.ac.id".to_string(),
                item_id: item_id.clone(),
                item_name: "Stapler".to_string(),
                quantity: 3,
                notes: "Exam week".to_string(),
            })
            .await
            .unwrap();

        let orders = store.list_orders().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, id);
        assert_eq!(orders[0].order_type, OrderType::Order);
        assert_eq!(orders[0].status, OrderStatus::Pending);
        assert!(!orders[0].date.is_empty());
    }

    #[tokio::test]
    async fn test_delete_referenced_item_is_in_use() {
        let store = store().await;
        let item_id = store.insert_item(&item("Stapler", 10, 10)).await.unwrap();
        store
            .insert_missing_report(&NewMissingReport {
                item_id: item_id.clone(),
                item_name: "Stapler".to_string(),
                reported_by: "staff@campus.ac.id".to_string(),
                quantity: 1,
                notes: "Shelf empty".to_string(),
            })
            .await
            .unwrap();

        let err = store.delete_item(&item_id).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKey));
        assert_eq!(store.list_items().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unreferenced_item() {
        let store = store().await;
        let item_id = store.insert_item(&item("Stapler", 10, 10)).await.unwrap();
        store.delete_item(&item_id).await.unwrap();
        assert!(store.list_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_resolve_until_expiry() {
        let store = store().await;
        let user_id = store
            .insert_user(&NewUser {
                email: "staff@campus.ac.id".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Staff,
            })
            .await
            .unwrap();
        store
            .insert_session(&NewSession {
                user_id,
                token_hash: "abc".to_string(),
                expires_at: "2026-01-02T00:00:00.000Z".to_string(),
            })
            .await
            .unwrap();

        let user = store
            .find_session_user("abc", "2026-01-01T00:00:00.000Z")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role, Role::Staff);

        let expired = store
            .find_session_user("abc", "2026-01-03T00:00:00.000Z")
            .await
            .unwrap();
        assert!(expired.is_none());

        store.delete_session("abc").await.unwrap();
        let gone = store
            .find_session_user("abc", "2026-01-01T00:00:00.000Z")
            .await
            .unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_purge_expired_sessions() {
        let store = store().await;
        let user_id = store
            .insert_user(&NewUser {
                email: "lecturer@campus.ac.id".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Lecturer,
            })
            .await
            .unwrap();
        for (token_hash, expires_at) in [
            ("old", "2026-01-01T00:00:00.000Z"),
            ("edge", "2026-01-02T00:00:00.000Z"),
            ("live", "2026-01-03T00:00:00.000Z"),
        ] {
            store
                .insert_session(&NewSession {
                    user_id: user_id.clone(),
                    token_hash: token_hash.to_string(),
                    expires_at: expires_at.to_string(),
                })
                .await
                .unwrap();
        }

        let purged = store
            .purge_expired_sessions("2026-01-02T00:00:00.000Z")
            .await
            .unwrap();
        assert_eq!(purged, 2);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
        assert!(store
            .find_session_user("live", "2026-01-02T00:00:00.000Z")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = store().await;
        let user = NewUser {
            email: "dup@campus.ac.id".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Lecturer,
        };
        store.insert_user(&user).await.unwrap();
        let err = store.insert_user(&user).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }
}
