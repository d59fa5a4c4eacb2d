//! Contracts for the external AI/knowledge collaborators.
//!
//! Adapters hold no pipeline logic; they map requests and responses and
//! classify failures so the retry layer can tell transient outages from
//! unusable answers.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use reloom_core::{ConversionFactors, GarmentAttributes, ItemInput, MarketAnalysis, Season};

#[derive(Clone, Debug, Error, PartialEq)]
pub enum AdapterError {
    #[error("could not reach {service}: {reason}")]
    Transport { service: &'static str, reason: String },
    #[error("timed out waiting for {service}")]
    Timeout { service: &'static str },
    #[error("{service} throttled the request")]
    Throttled { service: &'static str },
    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },
    #[error("unusable response from {service}: {reason}")]
    Malformed { service: &'static str, reason: String },
}

impl crate::retry::Retryable for AdapterError {
    /// Transient failures are retried; everything else propagates
    /// immediately.
    fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } | Self::Throttled { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Malformed { .. } => false,
        }
    }
}

/// One labeled candidate from the vision collaborator; confidence in [0, 100].
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LabelCandidate {
    pub name: String,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct VisionDetection {
    pub labels: Vec<LabelCandidate>,
    #[serde(default)]
    pub text: Vec<String>,
}

/// Trend data plus the conversion factors riding along with it.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TrendSnapshot {
    #[serde(default)]
    pub headlines: Vec<String>,
    pub conversion_factors: ConversionFactors,
}

impl TrendSnapshot {
    /// Built-in snapshot used when the knowledge service is unavailable.
    pub fn fallback() -> Self {
        Self { headlines: Vec::new(), conversion_factors: ConversionFactors::default() }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MarketExplainRequest {
    pub attributes: GarmentAttributes,
    pub input: ItemInput,
    pub season: Season,
    pub trend_headlines: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StrategyProposeRequest {
    pub attributes: GarmentAttributes,
    pub market_analysis: MarketAnalysis,
    pub input: ItemInput,
}

/// Raw strategy candidate as proposed by the reasoning collaborator. Every
/// field is optional on the wire; validation happens in the strategy stage.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StrategyCandidate {
    pub kind: Option<String>,
    pub description: Option<String>,
    pub effort_level: Option<String>,
    pub cost_estimate: Option<Decimal>,
    pub expected_resale_value: Option<Decimal>,
}

#[async_trait]
pub trait VisionAdapter: Send + Sync {
    async fn detect(&self, image_ref: &str) -> Result<VisionDetection, AdapterError>;
}

#[async_trait]
pub trait KnowledgeAdapter: Send + Sync {
    async fn retrieve_trends(
        &self,
        category: &str,
        region: &str,
        season: Season,
    ) -> Result<TrendSnapshot, AdapterError>;
}

#[async_trait]
pub trait ReasoningAdapter: Send + Sync {
    async fn explain(&self, request: &MarketExplainRequest) -> Result<String, AdapterError>;

    async fn propose(
        &self,
        request: &StrategyProposeRequest,
    ) -> Result<Vec<StrategyCandidate>, AdapterError>;
}
