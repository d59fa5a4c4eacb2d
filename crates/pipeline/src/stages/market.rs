//! Market analysis stage: trend retrieval with degradation fallback, then a
//! reasoning request whose answer must parse into a strict document.

use serde::Deserialize;
use tracing::warn;

use reloom_core::{
    DemandLevel, GarmentAttributes, ItemInput, MarketAnalysis, Season, TrendAlignment, TrendSource,
};

use crate::adapters::{KnowledgeAdapter, MarketExplainRequest, ReasoningAdapter, TrendSnapshot};
use crate::retry::RetryExecutor;
use crate::stages::StageError;

#[derive(Debug, Deserialize)]
struct MarketReasoningResponse {
    explanation: String,
    trend_alignment: TrendAlignment,
    seasonal_mismatch: bool,
    regional_demand: DemandLevel,
}

/// Trend data is an enrichment, not a correctness-critical dependency: an
/// unreachable knowledge service (or a snapshot with negative factors)
/// degrades to the built-in fallback instead of failing the run.
pub async fn fetch_trend_snapshot(
    knowledge: &dyn KnowledgeAdapter,
    retry: &RetryExecutor,
    category: &str,
    region: &str,
    season: Season,
) -> (TrendSnapshot, TrendSource) {
    match retry
        .execute("knowledge.retrieve_trends", || knowledge.retrieve_trends(category, region, season))
        .await
    {
        Ok(snapshot) if snapshot.conversion_factors.is_usable() => (snapshot, TrendSource::Live),
        Ok(_) => {
            warn!(
                event_name = "pipeline.trend_fallback",
                category,
                region,
                season = %season,
                "knowledge snapshot carried negative conversion factors, using defaults"
            );
            (TrendSnapshot::fallback(), TrendSource::Fallback)
        }
        Err(error) => {
            warn!(
                event_name = "pipeline.trend_fallback",
                category,
                region,
                season = %season,
                error = %error,
                "knowledge service unavailable, using default trend snapshot"
            );
            (TrendSnapshot::fallback(), TrendSource::Fallback)
        }
    }
}

pub async fn analyze_market(
    reasoning: &dyn ReasoningAdapter,
    retry: &RetryExecutor,
    attributes: &GarmentAttributes,
    input: &ItemInput,
    season: Season,
    snapshot: &TrendSnapshot,
    trend_source: TrendSource,
) -> Result<MarketAnalysis, StageError> {
    let request = MarketExplainRequest {
        attributes: attributes.clone(),
        input: input.clone(),
        season,
        trend_headlines: snapshot.headlines.clone(),
    };

    let raw = retry.execute("reasoning.explain", || reasoning.explain(&request)).await?;
    parse_reasoning(&raw, trend_source)
}

pub(crate) fn parse_reasoning(
    raw: &str,
    trend_source: TrendSource,
) -> Result<MarketAnalysis, StageError> {
    let response: MarketReasoningResponse = serde_json::from_str(raw).map_err(|error| {
        StageError::MalformedResponse {
            service: "reasoning".to_string(),
            reason: format!("explanation document is not valid JSON: {error}"),
        }
    })?;

    if response.explanation.trim().is_empty() {
        return Err(StageError::MalformedResponse {
            service: "reasoning".to_string(),
            reason: "explanation is empty".to_string(),
        });
    }

    Ok(MarketAnalysis {
        explanation: response.explanation,
        trend_alignment: response.trend_alignment,
        seasonal_mismatch: response.seasonal_mismatch,
        regional_demand: response.regional_demand,
        trend_source,
    })
}

#[cfg(test)]
mod tests {
    use reloom_core::{DemandLevel, TrendAlignment, TrendSource};

    use crate::stages::StageError;

    use super::parse_reasoning;

    #[test]
    fn well_formed_document_parses() {
        let raw = r#"{
            "explanation": "printed shirts are trending down in coastal regions",
            "trend_alignment": "low",
            "seasonal_mismatch": true,
            "regional_demand": "medium"
        }"#;

        let analysis = parse_reasoning(raw, TrendSource::Live).expect("parses");

        assert_eq!(analysis.trend_alignment, TrendAlignment::Low);
        assert!(analysis.seasonal_mismatch);
        assert_eq!(analysis.regional_demand, DemandLevel::Medium);
        assert_eq!(analysis.trend_source, TrendSource::Live);
    }

    #[test]
    fn free_text_is_malformed() {
        let error = parse_reasoning("the market looks fine to me", TrendSource::Live)
            .expect_err("must reject");
        assert!(matches!(error, StageError::MalformedResponse { .. }));
    }

    #[test]
    fn missing_categorical_field_is_malformed() {
        let raw = r#"{"explanation": "demand is strong", "trend_alignment": "high"}"#;
        let error = parse_reasoning(raw, TrendSource::Live).expect_err("must reject");
        assert!(matches!(error, StageError::MalformedResponse { .. }));
    }

    #[test]
    fn empty_explanation_is_malformed() {
        let raw = r#"{
            "explanation": "   ",
            "trend_alignment": "high",
            "seasonal_mismatch": false,
            "regional_demand": "high"
        }"#;
        let error = parse_reasoning(raw, TrendSource::Live).expect_err("must reject");
        assert!(matches!(error, StageError::MalformedResponse { .. }));
    }

    #[test]
    fn unknown_categorical_value_is_malformed() {
        let raw = r#"{
            "explanation": "demand is strong",
            "trend_alignment": "stratospheric",
            "seasonal_mismatch": false,
            "regional_demand": "high"
        }"#;
        let error = parse_reasoning(raw, TrendSource::Live).expect_err("must reject");
        assert!(matches!(error, StageError::MalformedResponse { .. }));
    }
}
