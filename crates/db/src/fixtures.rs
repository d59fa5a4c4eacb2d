use chrono::Utc;

use reloom_core::{InventoryItem, ItemId, ItemInput};

use crate::store::{ItemStore, StoreError};

/// Deterministic demo dataset: pending items ready for a pipeline run.
/// Idempotent; items that already exist are left untouched.
pub async fn seed_demo_items(store: &dyn ItemStore) -> Result<Vec<ItemId>, StoreError> {
    let now = Utc::now();
    let mut seeded = Vec::new();

    for (id, category, quantity, region, days_unsold) in [
        ("demo-shirt-001", "shirt", 100_u32, "Mumbai", 90_u32),
        ("demo-jeans-002", "jeans", 40, "Delhi", 120),
        ("demo-saree-003", "saree", 15, "Chennai", 45),
    ] {
        let item_id = ItemId(id.to_string());
        if store.fetch(&item_id).await?.is_some() {
            continue;
        }

        let item = InventoryItem::new(
            item_id.clone(),
            ItemInput {
                category: category.to_string(),
                quantity,
                region: region.to_string(),
                days_unsold,
                image_ref: format!("s3://reloom-demo/{id}.jpg"),
            },
            now,
        );
        store.insert(item).await?;
        seeded.push(item_id);
    }

    Ok(seeded)
}
