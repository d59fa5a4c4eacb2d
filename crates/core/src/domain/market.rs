use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendAlignment {
    High,
    Moderate,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    High,
    Medium,
    Low,
}

/// Where the trend snapshot behind an analysis came from. `Fallback` marks a
/// run that proceeded on the built-in defaults after the knowledge service
/// was unavailable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSource {
    Live,
    Fallback,
}

/// Output of the market analysis stage. Written once per pipeline run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub explanation: String,
    pub trend_alignment: TrendAlignment,
    pub seasonal_mismatch: bool,
    pub regional_demand: DemandLevel,
    pub trend_source: TrendSource,
}
