use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use reloom_core::{InventoryItem, ItemId, ItemStatus};

use crate::store::{ItemPatch, ItemStore, StoreError};

/// In-memory gateway with the same conditional-update semantics as the SQL
/// implementation. Used by tests and fixtures.
#[derive(Default)]
pub struct InMemoryItemStore {
    items: RwLock<HashMap<String, InventoryItem>>,
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn fetch(&self, id: &ItemId) -> Result<Option<InventoryItem>, StoreError> {
        let items = self.items.read().await;
        Ok(items.get(&id.0).cloned())
    }

    async fn insert(&self, item: InventoryItem) -> Result<(), StoreError> {
        let mut items = self.items.write().await;
        items.insert(item.id.0.clone(), item);
        Ok(())
    }

    async fn apply(
        &self,
        id: &ItemId,
        expected: ItemStatus,
        patch: ItemPatch,
    ) -> Result<InventoryItem, StoreError> {
        let mut items = self.items.write().await;
        let item = items.get_mut(&id.0).ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if item.status != expected {
            return Err(StoreError::StatusConflict { id: id.clone(), expected });
        }

        patch.apply_to(item)?;
        Ok(item.clone())
    }
}
