use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::sustainability::SustainabilityMetrics;

/// The four canonical reuse actions. Candidates outside this set are dropped
/// during strategy generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Redesign,
    Repurpose,
    Resale,
    Redistribution,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Redesign => "redesign",
            Self::Repurpose => "repurpose",
            Self::Resale => "resale",
            Self::Redistribution => "redistribution",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redesign" => Some(Self::Redesign),
            "repurpose" => Some(Self::Repurpose),
            "resale" => Some(Self::Resale),
            "redistribution" => Some(Self::Redistribution),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortLevel {
    Low,
    Medium,
    High,
}

impl EffortLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReuseStrategy {
    pub kind: StrategyKind,
    pub description: String,
    pub effort_level: EffortLevel,
    pub cost_estimate: Decimal,
    pub expected_resale_value: Decimal,
    pub profit_recovery: Decimal,
    pub sustainability: SustainabilityMetrics,
}

impl ReuseStrategy {
    /// Profit recovery is always derived locally, never taken from an
    /// external response.
    pub fn profit_recovery(cost_estimate: Decimal, expected_resale_value: Decimal) -> Decimal {
        expected_resale_value - cost_estimate
    }
}
