use crate::domain::strategy::ReuseStrategy;

/// Stable sort descending by profit recovery. Equal-profit strategies keep
/// their generation order.
pub fn rank_strategies(mut strategies: Vec<ReuseStrategy>) -> Vec<ReuseStrategy> {
    strategies.sort_by(|a, b| b.profit_recovery.cmp(&a.profit_recovery));
    strategies
}

/// Derived fact: once the list is ranked, the best strategy is the head.
pub fn best_strategy_index(strategies: &[ReuseStrategy]) -> Option<usize> {
    if strategies.is_empty() {
        None
    } else {
        Some(0)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::strategy::{EffortLevel, ReuseStrategy, StrategyKind};
    use crate::sustainability::SustainabilityMetrics;

    use super::{best_strategy_index, rank_strategies};

    fn strategy(description: &str, profit: i64) -> ReuseStrategy {
        ReuseStrategy {
            kind: StrategyKind::Resale,
            description: description.to_string(),
            effort_level: EffortLevel::Low,
            cost_estimate: Decimal::ZERO,
            expected_resale_value: Decimal::new(profit, 2),
            profit_recovery: Decimal::new(profit, 2),
            sustainability: SustainabilityMetrics::default(),
        }
    }

    #[test]
    fn orders_descending_by_profit_recovery() {
        let ranked = rank_strategies(vec![
            strategy("low", 1_000),
            strategy("high", 9_000),
            strategy("mid", 4_000),
        ]);

        let profits: Vec<_> = ranked.iter().map(|s| s.profit_recovery).collect();
        assert_eq!(profits, vec![Decimal::new(9_000, 2), Decimal::new(4_000, 2), Decimal::new(1_000, 2)]);
        assert_eq!(best_strategy_index(&ranked), Some(0));
    }

    #[test]
    fn equal_profit_keeps_generation_order() {
        let ranked = rank_strategies(vec![
            strategy("first", 2_000),
            strategy("second", 2_000),
            strategy("third", 2_000),
        ]);

        let order: Vec<_> = ranked.iter().map(|s| s.description.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_list_has_no_best_strategy() {
        assert_eq!(best_strategy_index(&[]), None);
        assert!(rank_strategies(Vec::new()).is_empty());
    }
}
