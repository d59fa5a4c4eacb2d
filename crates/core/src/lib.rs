pub mod config;
pub mod domain;
pub mod errors;
pub mod ranking;
pub mod season;
pub mod sustainability;

pub use domain::attributes::GarmentAttributes;
pub use domain::item::{InventoryItem, ItemId, ItemInput, ItemStatus};
pub use domain::market::{DemandLevel, MarketAnalysis, TrendAlignment, TrendSource};
pub use domain::strategy::{EffortLevel, ReuseStrategy, StrategyKind};
pub use errors::DomainError;
pub use ranking::{best_strategy_index, rank_strategies};
pub use season::{season_for, Season};
pub use sustainability::{ConversionFactors, SustainabilityMetrics};
