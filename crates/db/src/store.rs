use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use reloom_core::{
    DomainError, GarmentAttributes, InventoryItem, ItemId, ItemStatus, MarketAnalysis,
    ReuseStrategy, SustainabilityMetrics,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("item not found: {0}")]
    NotFound(ItemId),
    #[error("status conflict for item {id}: expected {expected}, record has moved on")]
    StatusConflict { id: ItemId, expected: ItemStatus },
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Fields a single stage transition is allowed to write. Everything left as
/// `None` stays untouched, which keeps the one-writer-per-field invariant a
/// structural fact rather than a convention.
#[derive(Clone, Debug)]
pub struct ItemPatch {
    pub status: ItemStatus,
    pub attributes: Option<GarmentAttributes>,
    pub market_analysis: Option<MarketAnalysis>,
    pub strategies: Option<Vec<ReuseStrategy>>,
    pub best_strategy_index: Option<usize>,
    pub total_impact: Option<SustainabilityMetrics>,
    pub error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ItemPatch {
    fn bare(status: ItemStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            status,
            attributes: None,
            market_analysis: None,
            strategies: None,
            best_strategy_index: None,
            total_impact: None,
            error_message: None,
            updated_at,
        }
    }

    pub fn attributes_extracted(attributes: GarmentAttributes, now: DateTime<Utc>) -> Self {
        Self { attributes: Some(attributes), ..Self::bare(ItemStatus::AttributesExtracted, now) }
    }

    pub fn market_analyzed(analysis: MarketAnalysis, now: DateTime<Utc>) -> Self {
        Self { market_analysis: Some(analysis), ..Self::bare(ItemStatus::MarketAnalyzed, now) }
    }

    pub fn completed(
        strategies: Vec<ReuseStrategy>,
        best_strategy_index: usize,
        total_impact: SustainabilityMetrics,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            strategies: Some(strategies),
            best_strategy_index: Some(best_strategy_index),
            total_impact: Some(total_impact),
            ..Self::bare(ItemStatus::Completed, now)
        }
    }

    pub fn failed(error_message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self { error_message: Some(error_message.into()), ..Self::bare(ItemStatus::Failed, now) }
    }

    /// Applies the patch through the status state machine, so an invalid
    /// transition is rejected before anything is written.
    pub fn apply_to(self, item: &mut InventoryItem) -> Result<(), DomainError> {
        item.transition_to(self.status)?;
        if let Some(attributes) = self.attributes {
            item.attributes = Some(attributes);
        }
        if let Some(analysis) = self.market_analysis {
            item.market_analysis = Some(analysis);
        }
        if let Some(strategies) = self.strategies {
            item.strategies = Some(strategies);
        }
        if let Some(index) = self.best_strategy_index {
            item.best_strategy_index = Some(index);
        }
        if let Some(total) = self.total_impact {
            item.total_impact = Some(total);
        }
        if let Some(message) = self.error_message {
            item.error_message = Some(message);
        }
        item.updated_at = self.updated_at;
        Ok(())
    }
}

/// Persistence gateway for inventory items.
///
/// `apply` is a conditional update: it only writes when the stored status
/// still matches `expected`, guarding against duplicate concurrent pipeline
/// runs for the same item.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn fetch(&self, id: &ItemId) -> Result<Option<InventoryItem>, StoreError>;

    async fn insert(&self, item: InventoryItem) -> Result<(), StoreError>;

    async fn apply(
        &self,
        id: &ItemId,
        expected: ItemStatus,
        patch: ItemPatch,
    ) -> Result<InventoryItem, StoreError>;
}
