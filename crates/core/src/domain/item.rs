use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::attributes::GarmentAttributes;
use crate::domain::market::MarketAnalysis;
use crate::domain::strategy::ReuseStrategy;
use crate::errors::DomainError;
use crate::sustainability::SustainabilityMetrics;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    AttributesExtracted,
    MarketAnalyzed,
    Completed,
    Failed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AttributesExtracted => "attributes_extracted",
            Self::MarketAnalyzed => "market_analyzed",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "attributes_extracted" => Some(Self::AttributesExtracted),
            "market_analyzed" => Some(Self::MarketAnalyzed),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Position in the fixed lifecycle order. Both terminal statuses share
    /// the highest rank so that monotonicity can be checked numerically.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::AttributesExtracted => 1,
            Self::MarketAnalyzed => 2,
            Self::Completed | Self::Failed => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable user-supplied fields. Never cleared, even on failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInput {
    pub category: String,
    pub quantity: u32,
    pub region: String,
    pub days_unsold: u32,
    pub image_ref: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub status: ItemStatus,
    pub input: ItemInput,
    pub attributes: Option<GarmentAttributes>,
    pub market_analysis: Option<MarketAnalysis>,
    pub strategies: Option<Vec<ReuseStrategy>>,
    pub best_strategy_index: Option<usize>,
    pub total_impact: Option<SustainabilityMetrics>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn new(id: ItemId, input: ItemInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            status: ItemStatus::Pending,
            input,
            attributes: None,
            market_analysis: None,
            strategies: None,
            best_strategy_index: None,
            total_impact: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_transition_to(&self, next: ItemStatus) -> bool {
        matches!(
            (self.status, next),
            (ItemStatus::Pending, ItemStatus::AttributesExtracted)
                | (ItemStatus::AttributesExtracted, ItemStatus::MarketAnalyzed)
                | (ItemStatus::MarketAnalyzed, ItemStatus::Completed)
                | (ItemStatus::Pending, ItemStatus::Failed)
                | (ItemStatus::AttributesExtracted, ItemStatus::Failed)
                | (ItemStatus::MarketAnalyzed, ItemStatus::Failed)
        )
    }

    pub fn transition_to(&mut self, next: ItemStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidStatusTransition { from: self.status, to: next })
    }
}
