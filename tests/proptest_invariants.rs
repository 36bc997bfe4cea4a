//! Property-based tests for rebalancing invariants.
//!
//! These tests use proptest to verify that the cash-only rebalance holds
//! its guarantees across randomly generated policies and holdings.

use portfoli::{
    AllocationPlan, AllocationTarget, Error, Policy, Position, Symbol, get_policy, lookup,
};
use proptest::prelude::*;

/// Generate a valid policy: 1..8 lines with positive shares normalized to 1.
fn policy_strategy() -> impl Strategy<Value = Policy> {
    prop::collection::vec(1u32..=100, 1..8).prop_map(|weights| {
        let total: u32 = weights.iter().sum();
        let targets = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| AllocationTarget {
                symbol: Symbol::new(&format!("S{i}")),
                desired_percent: w as f64 / total as f64,
            })
            .collect();
        Policy::new("Random", targets)
    })
}

/// Generate a holding value, zero included.
fn value_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), 0.0f64..1_000_000.0]
}

fn positions_for(policy: &Policy, values: &[f64]) -> Vec<Position> {
    policy
        .targets
        .iter()
        .zip(values)
        .map(|(t, &v)| Position::new(t.symbol, v))
        .collect()
}

fn tolerance(total: f64) -> f64 {
    1e-6 + total.abs() * 1e-9
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // ========================================================================
    // CASH INVARIANTS
    // ========================================================================

    /// Required cash is never negative
    #[test]
    fn required_cash_non_negative(
        policy in policy_strategy(),
        values in prop::collection::vec(value_strategy(), 8),
    ) {
        let mut plan = AllocationPlan::build(&policy, &positions_for(&policy, &values)).unwrap();
        let outcome = plan.rebalance().unwrap();

        prop_assert!(outcome.required_cash >= 0.0, "negative cash: {}", outcome.required_cash);
        prop_assert_eq!(plan.required_cash(), Some(outcome.required_cash));
    }

    /// After rebalancing no line has to be sold
    #[test]
    fn no_line_needs_selling(
        policy in policy_strategy(),
        values in prop::collection::vec(value_strategy(), 8),
    ) {
        let mut plan = AllocationPlan::build(&policy, &positions_for(&policy, &values)).unwrap();
        let outcome = plan.rebalance().unwrap();
        let eps = tolerance(outcome.new_total);

        for line in plan.lines() {
            prop_assert!(
                line.desired_value >= line.current_value - eps,
                "{} must sell: desired {} < current {}",
                line.symbol, line.desired_value, line.current_value
            );
        }
    }

    /// The binding line ends exactly on target
    #[test]
    fn binding_line_meets_target(
        policy in policy_strategy(),
        values in prop::collection::vec(value_strategy(), 8),
    ) {
        let mut plan = AllocationPlan::build(&policy, &positions_for(&policy, &values)).unwrap();
        let outcome = plan.rebalance().unwrap();
        let eps = tolerance(outcome.new_total);

        match outcome.binding {
            Some(symbol) => {
                let line = plan.line(symbol).unwrap();
                prop_assert!(
                    (line.desired_value - line.current_value).abs() <= eps,
                    "binding {} off target: desired {} current {}",
                    symbol, line.desired_value, line.current_value
                );
            }
            None => {
                // Nothing over-allocated: every line is already on target
                prop_assert!(plan.lines().iter().all(|l| l.deficit().abs() <= eps * 8.0));
            }
        }
    }

    /// A portfolio already on target needs no cash
    #[test]
    fn balanced_plan_needs_no_cash(
        policy in policy_strategy(),
        total in 1.0f64..1_000_000.0,
    ) {
        let positions: Vec<Position> = policy
            .targets
            .iter()
            .map(|t| Position::new(t.symbol, t.desired_percent * total))
            .collect();

        let mut plan = AllocationPlan::build(&policy, &positions).unwrap();
        let outcome = plan.rebalance().unwrap();
        prop_assert!(outcome.required_cash < tolerance(total), "cash {}", outcome.required_cash);
    }

    /// Rescaling never shrinks the portfolio
    #[test]
    fn new_total_at_least_base(
        policy in policy_strategy(),
        values in prop::collection::vec(value_strategy(), 8),
    ) {
        let mut plan = AllocationPlan::build(&policy, &positions_for(&policy, &values)).unwrap();
        let outcome = plan.rebalance().unwrap();
        prop_assert!(outcome.new_total >= outcome.base_total - tolerance(outcome.base_total));
    }

    // ========================================================================
    // POLICY INVARIANTS
    // ========================================================================

    /// Shares summing (rounded) to anything but 1 are rejected
    #[test]
    fn oversubscribed_policy_rejected(
        shares in prop::collection::vec(0.5f64..=1.0, 3..6),
    ) {
        // 3 shares of at least 0.5 sum to at least 1.5, which rounds to 2
        let targets = shares
            .iter()
            .enumerate()
            .map(|(i, &p)| AllocationTarget {
                symbol: Symbol::new(&format!("S{i}")),
                desired_percent: p,
            })
            .collect();
        let policy = Policy::new("Over", targets);
        let rejected = matches!(policy.validate(), Err(Error::InvalidPolicy { .. }));
        prop_assert!(rejected);
    }

    // ========================================================================
    // CLASS BREAKDOWN
    // ========================================================================

    /// Class percentages add up to the current shares of catalog-known lines
    #[test]
    fn class_breakdown_sums_to_known_lines(
        values in prop::collection::vec(value_strategy(), 8),
    ) {
        let policy = get_policy("Current").unwrap();
        let mut plan = AllocationPlan::build(&policy, &positions_for(&policy, &values)).unwrap();
        plan.compute_current_percents();

        let known: f64 = plan
            .lines()
            .iter()
            .filter(|l| lookup(l.symbol).is_ok())
            .map(|l| l.current_percent)
            .sum();
        let by_class: f64 = plan.class_percent_breakdown().iter().map(|(_, p)| p).sum();

        prop_assert!((known - by_class).abs() < 1e-6, "known {} vs classes {}", known, by_class);
    }
}
