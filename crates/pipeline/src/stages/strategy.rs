//! Strategy generation: candidate validation, local profit computation, and
//! per-strategy sustainability metrics.

use rust_decimal::Decimal;
use tracing::warn;

use reloom_core::{
    sustainability, ConversionFactors, EffortLevel, GarmentAttributes, ItemInput, MarketAnalysis,
    ReuseStrategy, StrategyKind,
};

use crate::adapters::{ReasoningAdapter, StrategyCandidate, StrategyProposeRequest};
use crate::retry::RetryExecutor;
use crate::stages::StageError;

pub async fn generate_strategies(
    reasoning: &dyn ReasoningAdapter,
    retry: &RetryExecutor,
    attributes: &GarmentAttributes,
    market_analysis: &MarketAnalysis,
    input: &ItemInput,
    factors: &ConversionFactors,
) -> Result<Vec<ReuseStrategy>, StageError> {
    let request = StrategyProposeRequest {
        attributes: attributes.clone(),
        market_analysis: market_analysis.clone(),
        input: input.clone(),
    };

    let candidates = retry.execute("reasoning.propose", || reasoning.propose(&request)).await?;

    let mut strategies = Vec::new();
    for (index, candidate) in candidates.into_iter().enumerate() {
        match validate_candidate(candidate) {
            Ok(valid) => strategies.push(ReuseStrategy {
                kind: valid.kind,
                description: valid.description,
                effort_level: valid.effort_level,
                cost_estimate: valid.cost_estimate,
                expected_resale_value: valid.expected_resale_value,
                profit_recovery: ReuseStrategy::profit_recovery(
                    valid.cost_estimate,
                    valid.expected_resale_value,
                ),
                sustainability: sustainability::compute(input.quantity, factors),
            }),
            Err(reason) => {
                warn!(
                    event_name = "pipeline.candidate_dropped",
                    index,
                    reason = %reason,
                    "dropping unusable strategy candidate"
                );
            }
        }
    }

    if strategies.is_empty() {
        return Err(StageError::EmptyCandidateSet);
    }

    Ok(strategies)
}

#[derive(Debug)]
struct ValidCandidate {
    kind: StrategyKind,
    description: String,
    effort_level: EffortLevel,
    cost_estimate: Decimal,
    expected_resale_value: Decimal,
}

fn validate_candidate(candidate: StrategyCandidate) -> Result<ValidCandidate, String> {
    let kind_raw = candidate.kind.ok_or_else(|| "missing kind".to_string())?;
    let kind = StrategyKind::parse(&kind_raw).ok_or_else(|| format!("unknown kind `{kind_raw}`"))?;

    let description = candidate
        .description
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| "missing description".to_string())?;

    let effort_raw = candidate.effort_level.ok_or_else(|| "missing effort level".to_string())?;
    let effort_level = EffortLevel::parse(&effort_raw)
        .ok_or_else(|| format!("unknown effort level `{effort_raw}`"))?;

    let cost_estimate =
        candidate.cost_estimate.ok_or_else(|| "missing cost estimate".to_string())?;
    let expected_resale_value = candidate
        .expected_resale_value
        .ok_or_else(|| "missing expected resale value".to_string())?;

    if cost_estimate < Decimal::ZERO || expected_resale_value < Decimal::ZERO {
        return Err("negative money field".to_string());
    }

    Ok(ValidCandidate { kind, description, effort_level, cost_estimate, expected_resale_value })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::adapters::StrategyCandidate;

    use super::validate_candidate;

    fn complete_candidate() -> StrategyCandidate {
        StrategyCandidate {
            kind: Some("resale".to_string()),
            description: Some("sell through outlet partners".to_string()),
            effort_level: Some("low".to_string()),
            cost_estimate: Some(Decimal::new(2_000, 2)),
            expected_resale_value: Some(Decimal::new(9_000, 2)),
        }
    }

    #[test]
    fn complete_candidate_validates() {
        let valid = validate_candidate(complete_candidate()).expect("valid");
        assert_eq!(valid.description, "sell through outlet partners");
    }

    #[test]
    fn candidate_outside_canonical_kinds_is_dropped() {
        let candidate = StrategyCandidate { kind: Some("incinerate".to_string()), ..complete_candidate() };
        let reason = validate_candidate(candidate).expect_err("dropped");
        assert!(reason.contains("unknown kind"));
    }

    #[test]
    fn candidate_missing_a_money_field_is_dropped() {
        let candidate = StrategyCandidate { expected_resale_value: None, ..complete_candidate() };
        let reason = validate_candidate(candidate).expect_err("dropped");
        assert_eq!(reason, "missing expected resale value");
    }

    #[test]
    fn candidate_with_blank_description_is_dropped() {
        let candidate = StrategyCandidate { description: Some("  ".to_string()), ..complete_candidate() };
        let reason = validate_candidate(candidate).expect_err("dropped");
        assert_eq!(reason, "missing description");
    }

    #[test]
    fn candidate_with_negative_cost_is_dropped() {
        let candidate =
            StrategyCandidate { cost_estimate: Some(Decimal::new(-100, 2)), ..complete_candidate() };
        let reason = validate_candidate(candidate).expect_err("dropped");
        assert_eq!(reason, "negative money field");
    }
}
