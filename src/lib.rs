pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod inventory;
pub mod report;
pub mod store;

pub use db::DbPool;

use config::Config;
use inventory::{Inventory, InventoryError};
use std::sync::Arc;
use store::InventoryStore;

/// Shared by every handler. The store handle lives inside `inventory`.
pub struct AppState {
    pub config: Config,
    pub inventory: Inventory,
}

impl AppState {
    /// Build the state and load the initial item, order and report snapshot
    pub async fn load(config: Config, store: Arc<dyn InventoryStore>) -> Result<Self, InventoryError> {
        let inventory = Inventory::load(store).await?;
        Ok(Self { config, inventory })
    }
}
