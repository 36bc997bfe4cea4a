//! Allocation plan and the rebalancing engine.
//!
//! A plan starts from a [`Policy`], takes the current value of each target
//! symbol from a set of [`Position`]s, and answers one question: what is the
//! smallest new portfolio total at which every line's target value covers
//! what is already held? The difference to today's total is the cash that
//! must be added so that nothing has to be sold.
//!
//! ```
//! use portfoli::{get_policy, AllocationPlan, Position, Symbol};
//!
//! let policy = get_policy("AllWeather").unwrap();
//! let positions = [
//!     Position::new(Symbol::new("VTI"), 3000.0),
//!     Position::new(Symbol::new("TLT"), 1000.0),
//!     Position::new(Symbol::new("IEF"), 1500.0),
//!     Position::new(Symbol::new("DBC"), 750.0),
//!     Position::new(Symbol::new("GLD"), 750.0),
//! ];
//!
//! let mut plan = AllocationPlan::build(&policy, &positions).unwrap();
//! let outcome = plan.rebalance().unwrap();
//!
//! assert_eq!(outcome.binding, Some(Symbol::new("VTI")));
//! assert!((outcome.required_cash - 3000.0).abs() < 1e-6);
//! ```

use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::asset::{self, AssetClass};
use crate::error::{Error, Result};
use crate::policy::Policy;
use crate::position::Position;
use crate::types::Symbol;

/// Absolute slack (in currency units) below which a line is not considered
/// over-allocated.
pub const VALUE_TOLERANCE: f64 = 1e-6;

/// One symbol's target share plus its current and desired values for a run.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AllocationLine {
    pub symbol: Symbol,
    pub desired_percent: f64,
    pub current_value: f64,
    /// `current_value / total`, rounded to 2 decimals.
    pub current_percent: f64,
    pub desired_value: f64,
}

impl AllocationLine {
    pub fn new(symbol: Symbol, desired_percent: f64, current_value: f64) -> Self {
        AllocationLine {
            symbol,
            desired_percent,
            current_value,
            current_percent: 0.0,
            desired_value: 0.0,
        }
    }

    /// `desired_value - current_value`. Negative means over-allocated.
    pub fn deficit(&self) -> f64 {
        self.desired_value - self.current_value
    }

    /// Portfolio total at which this line's holding exactly meets its target.
    fn binding_total(&self) -> f64 {
        self.current_value / self.desired_percent
    }
}

/// Result of a finished rebalance pass.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rebalance {
    /// Sum of current values before any new cash.
    pub base_total: f64,
    /// Smallest total at which no line must be sold.
    pub new_total: f64,
    /// `new_total - base_total`, never negative.
    pub required_cash: f64,
    /// The over-allocated line that fixed `new_total`, if any.
    pub binding: Option<Symbol>,
}

/// Where a plan is in its per-run lifecycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlanState {
    Built,
    Validated,
    PercentsComputed,
    /// Desired values were last computed for this total.
    DesiredComputed { total: f64 },
    Finalized(Rebalance),
}

/// An ordered set of allocation lines under a policy name.
#[derive(Clone, Debug)]
pub struct AllocationPlan {
    name: String,
    lines: Vec<AllocationLine>,
    state: PlanState,
}

impl AllocationPlan {
    /// Build a plan from a policy and the current holdings.
    ///
    /// Each target gets one line, in policy order. A line's current value is
    /// the summed value of all positions with its symbol (the same fund may
    /// sit in several accounts), or 0 if none match. Positions outside the
    /// policy are ignored.
    pub fn build(policy: &Policy, positions: &[Position]) -> Result<Self> {
        policy.validate()?;

        let mut held: FxHashMap<Symbol, f64> =
            policy.targets.iter().map(|t| (t.symbol, 0.0)).collect();
        for pos in positions {
            let Some(slot) = held.get_mut(&pos.symbol) else {
                debug!(
                    "{}: ignoring position {} ({:.2}) not in policy",
                    policy.name, pos.symbol, pos.current_value
                );
                continue;
            };
            let value = if pos.current_value.is_finite() && pos.current_value > 0.0 {
                pos.current_value
            } else {
                if pos.current_value != 0.0 {
                    warn!(
                        "{}: treating value {} of {} as 0",
                        policy.name, pos.current_value, pos.symbol
                    );
                }
                0.0
            };
            *slot += value;
        }

        let lines = policy
            .targets
            .iter()
            .map(|t| {
                AllocationLine::new(
                    t.symbol,
                    t.desired_percent,
                    held.get(&t.symbol).copied().unwrap_or(0.0),
                )
            })
            .collect();

        Ok(Self::from_lines(policy.name.clone(), lines))
    }

    /// Assemble a plan from raw lines without checking them.
    ///
    /// Call [`validate`](Self::validate) (or [`rebalance`](Self::rebalance),
    /// which does) before trusting any figure derived from it.
    pub fn from_lines(name: impl Into<String>, lines: Vec<AllocationLine>) -> Self {
        AllocationPlan {
            name: name.into(),
            lines,
            state: PlanState::Built,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[AllocationLine] {
        &self.lines
    }

    pub fn line(&self, symbol: Symbol) -> Option<&AllocationLine> {
        self.lines.iter().find(|l| l.symbol == symbol)
    }

    pub fn state(&self) -> PlanState {
        self.state
    }

    /// Check that the target shares sum to 1 (rounded) and are all usable.
    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self
            .lines
            .iter()
            .find(|l| {
                !l.desired_percent.is_finite()
                    || l.desired_percent <= 0.0
                    || l.desired_percent > 1.0
            })
        {
            return Err(Error::InvalidPolicy {
                name: self.name.clone(),
                reason: format!(
                    "share for {} must be in (0, 1], got {}",
                    bad.symbol, bad.desired_percent
                ),
            });
        }

        let sum: f64 = self.lines.iter().map(|l| l.desired_percent).sum();
        if sum.round() != 1.0 {
            return Err(Error::InvalidPlan {
                name: self.name.clone(),
                sum,
            });
        }
        Ok(())
    }

    fn mark_validated(&mut self) -> Result<()> {
        self.validate()?;
        if self.state == PlanState::Built {
            self.state = PlanState::Validated;
        }
        Ok(())
    }

    /// Sum of current values across all lines.
    pub fn current_total(&self) -> f64 {
        self.lines.iter().map(|l| l.current_value).sum()
    }

    /// Set each line's current share of the total, rounded to 2 decimals.
    ///
    /// No-op when the total rounds to zero.
    pub fn compute_current_percents(&mut self) {
        let total = self.current_total();
        if total.round() == 0.0 {
            return;
        }
        for line in &mut self.lines {
            line.current_percent = round2(line.current_value / total);
        }
        self.state = PlanState::PercentsComputed;
    }

    /// Set each line's desired value for a hypothetical portfolio `total`.
    pub fn compute_desired_values(&mut self, total: f64) {
        for line in &mut self.lines {
            line.desired_value = total * line.desired_percent;
        }
        self.state = PlanState::DesiredComputed { total };
    }

    /// The over-allocated line that limits the rebalance, if any.
    ///
    /// Over-allocated lines are ranked by how negative their deficit is
    /// relative to their target share, which is the same as ranking by
    /// `current_value / desired_percent`. Ties go to the earliest line in
    /// policy order. Returns `None` when no line holds more than its target.
    pub fn greatest_negative_deficit(&self) -> Option<&AllocationLine> {
        let mut worst: Option<&AllocationLine> = None;
        for line in &self.lines {
            if line.deficit() >= -VALUE_TOLERANCE {
                continue;
            }
            if worst.is_none_or(|w| line.binding_total() > w.binding_total()) {
                worst = Some(line);
            }
        }
        worst
    }

    /// Run one rebalance pass.
    ///
    /// Desired values are first computed at today's total. If some line holds
    /// more than its target, the plan is rescaled to the total at which the
    /// binding line's holding exactly equals its target; every other line's
    /// target then covers its holding too. One pass is enough.
    pub fn rebalance(&mut self) -> Result<Rebalance> {
        self.mark_validated()?;
        self.compute_current_percents();

        let base_total = self.current_total();
        self.compute_desired_values(base_total);

        let binding = self
            .greatest_negative_deficit()
            .map(|l| (l.symbol, l.binding_total()));

        let new_total = match binding {
            Some((symbol, total)) => {
                info!(
                    "{}: {symbol} is the binding line, rescaling total {base_total:.2} -> {total:.2}",
                    self.name
                );
                self.compute_desired_values(total);
                total
            }
            None => {
                info!("{}: already balanced at {base_total:.2}", self.name);
                base_total
            }
        };

        self.validate()?;

        let outcome = Rebalance {
            base_total,
            new_total,
            required_cash: (new_total - base_total).max(0.0),
            binding: binding.map(|(symbol, _)| symbol),
        };
        self.state = PlanState::Finalized(outcome);
        Ok(outcome)
    }

    /// Cash needed so that no line must be sold. `None` until rebalanced.
    pub fn required_cash(&self) -> Option<f64> {
        match self.state {
            PlanState::Finalized(outcome) => Some(outcome.required_cash),
            _ => None,
        }
    }

    /// Current share per asset class, in [`asset::asset_classes`] order.
    ///
    /// Lines whose symbol isn't in the catalog are left out with a warning.
    pub fn class_percent_breakdown(&self) -> Vec<(AssetClass, f64)> {
        let mut by_class: FxHashMap<AssetClass, f64> = FxHashMap::default();
        for line in &self.lines {
            match asset::lookup(line.symbol) {
                Ok(a) => *by_class.entry(a.class).or_insert(0.0) += line.current_percent,
                Err(e) => warn!(
                    "{}: skipping {} in class breakdown: {e}",
                    self.name, line.symbol
                ),
            }
        }

        asset::asset_classes()
            .iter()
            .map(|&class| (class, round2(by_class.get(&class).copied().unwrap_or(0.0))))
            .collect()
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{AllocationTarget, get_policy};

    fn pos(s: &str, v: f64) -> Position {
        Position::new(Symbol::new(s), v)
    }

    fn all_weather(values: [f64; 5]) -> AllocationPlan {
        let policy = get_policy("AllWeather").unwrap();
        let positions: Vec<Position> = ["VTI", "TLT", "IEF", "DBC", "GLD"]
            .iter()
            .zip(values)
            .map(|(s, v)| pos(s, v))
            .collect();
        AllocationPlan::build(&policy, &positions).unwrap()
    }

    #[test]
    fn build_fills_current_values_in_policy_order() {
        let policy = get_policy("AllWeather").unwrap();
        let plan = AllocationPlan::build(
            &policy,
            &[pos("GLD", 50.0), pos("AAPL", 999.0), pos("VTI", 100.0)],
        )
        .unwrap();

        let symbols: Vec<&str> = plan.lines().iter().map(|l| l.symbol.as_str()).collect();
        assert_eq!(symbols, ["VTI", "TLT", "IEF", "DBC", "GLD"]);
        assert_eq!(plan.line(Symbol::new("VTI")).unwrap().current_value, 100.0);
        assert_eq!(plan.line(Symbol::new("TLT")).unwrap().current_value, 0.0);
        assert_eq!(plan.line(Symbol::new("GLD")).unwrap().current_value, 50.0);
        // AAPL isn't tracked
        assert_eq!(plan.current_total(), 150.0);
        assert_eq!(plan.state(), PlanState::Built);
    }

    #[test]
    fn build_sums_same_symbol_across_accounts() {
        let policy = get_policy("AllWeather").unwrap();
        let plan =
            AllocationPlan::build(&policy, &[pos("VTI", 100.0), pos("VTI", 250.0)]).unwrap();
        assert_eq!(plan.line(Symbol::new("VTI")).unwrap().current_value, 350.0);
    }

    #[test]
    fn build_with_many_untracked_positions() {
        let policy = get_policy("AllWeather").unwrap();
        let mut positions: Vec<Position> = (0..5000)
            .map(|i| pos(&format!("X{i}"), 1.0))
            .collect();
        positions.push(pos("IEF", 40.0));
        positions.insert(2500, pos("IEF", 60.0));

        let plan = AllocationPlan::build(&policy, &positions).unwrap();
        assert_eq!(plan.line(Symbol::new("IEF")).unwrap().current_value, 100.0);
        assert_eq!(plan.current_total(), 100.0);
    }

    #[test]
    fn build_zeroes_negative_values() {
        let policy = get_policy("AllWeather").unwrap();
        let plan = AllocationPlan::build(&policy, &[pos("TLT", -20.0)]).unwrap();
        assert_eq!(plan.line(Symbol::new("TLT")).unwrap().current_value, 0.0);
    }

    #[test]
    fn build_rejects_invalid_policy() {
        let policy = Policy::new("Half", vec![AllocationTarget::new("VTI", 0.4)]);
        assert!(matches!(
            AllocationPlan::build(&policy, &[]),
            Err(Error::InvalidPolicy { .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_sum() {
        let plan = AllocationPlan::from_lines(
            "Broken",
            vec![
                AllocationLine::new(Symbol::new("VTI"), 0.9, 0.0),
                AllocationLine::new(Symbol::new("TLT"), 0.9, 0.0),
            ],
        );
        assert!(matches!(
            plan.validate(),
            Err(Error::InvalidPlan { ref name, .. }) if name == "Broken"
        ));
    }

    #[test]
    fn rebalance_refuses_invalid_plan() {
        let mut plan = AllocationPlan::from_lines(
            "Broken",
            vec![AllocationLine::new(Symbol::new("VTI"), 0.3, 100.0)],
        );
        assert!(plan.rebalance().is_err());
        assert_eq!(plan.required_cash(), None);
        assert_eq!(plan.state(), PlanState::Built);
    }

    #[test]
    fn validate_rejects_zero_share() {
        let plan = AllocationPlan::from_lines(
            "Zero",
            vec![
                AllocationLine::new(Symbol::new("VTI"), 1.0, 0.0),
                AllocationLine::new(Symbol::new("TLT"), 0.0, 10.0),
            ],
        );
        assert!(plan.validate().is_err());
    }

    #[test]
    fn validate_rejects_share_above_one() {
        // 1.3 rounds to 1, so only the per-line bound catches this
        let plan = AllocationPlan::from_lines(
            "Lopsided",
            vec![
                AllocationLine::new(Symbol::new("VTI"), 1.2, 0.0),
                AllocationLine::new(Symbol::new("TLT"), 0.1, 0.0),
            ],
        );
        let err = plan.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPolicy { ref reason, .. } if reason.contains("VTI")
        ));
    }

    #[test]
    fn current_percents_rounded() {
        let mut plan = all_weather([1.0, 1.0, 1.0, 0.0, 0.0]);
        plan.compute_current_percents();
        for line in &plan.lines()[..3] {
            assert_eq!(line.current_percent, 0.33);
        }
        assert_eq!(plan.lines()[3].current_percent, 0.0);
        assert_eq!(plan.state(), PlanState::PercentsComputed);
    }

    #[test]
    fn current_percents_noop_on_empty_total() {
        let mut plan = all_weather([0.0, 0.0, 0.0, 0.0, 0.4]);
        plan.compute_current_percents();
        assert!(plan.lines().iter().all(|l| l.current_percent == 0.0));
        assert_eq!(plan.state(), PlanState::Built);
    }

    #[test]
    fn desired_values_follow_total() {
        let mut plan = all_weather([0.0; 5]);
        plan.compute_desired_values(1000.0);
        assert_eq!(plan.lines()[1].desired_value, 400.0);
        plan.compute_desired_values(2000.0);
        assert_eq!(plan.lines()[1].desired_value, 800.0);
        assert_eq!(plan.state(), PlanState::DesiredComputed { total: 2000.0 });
    }

    #[test]
    fn greatest_negative_deficit_none_when_balanced() {
        let mut plan = all_weather([3000.0, 4000.0, 1500.0, 750.0, 750.0]);
        plan.compute_desired_values(plan.current_total());
        assert!(plan.greatest_negative_deficit().is_none());
    }

    #[test]
    fn greatest_negative_deficit_picks_highest_ratio() {
        // At total 1000: VTI deficit -100 (ratio 1333), DBC deficit -75 (ratio 2000)
        let mut plan = all_weather([400.0, 300.0, 150.0, 150.0, 0.0]);
        plan.compute_desired_values(plan.current_total());
        let worst = plan.greatest_negative_deficit().unwrap();
        assert_eq!(worst.symbol, Symbol::new("DBC"));
    }

    #[test]
    fn greatest_negative_deficit_ties_go_to_first() {
        let mut plan = all_weather([3000.0, 1000.0, 1500.0, 750.0, 750.0]);
        plan.compute_desired_values(plan.current_total());
        assert_eq!(
            plan.greatest_negative_deficit().unwrap().symbol,
            Symbol::new("VTI")
        );
    }

    #[test]
    fn rebalance_balanced_needs_no_cash() {
        let mut plan = all_weather([3000.0, 4000.0, 1500.0, 750.0, 750.0]);
        assert_eq!(plan.required_cash(), None);
        let outcome = plan.rebalance().unwrap();
        assert_eq!(outcome.required_cash, 0.0);
        assert_eq!(outcome.binding, None);
        assert_eq!(outcome.new_total, outcome.base_total);
        assert_eq!(plan.required_cash(), Some(0.0));
    }

    #[test]
    fn rebalance_underweight_bonds() {
        let mut plan = all_weather([3000.0, 1000.0, 1500.0, 750.0, 750.0]);
        let outcome = plan.rebalance().unwrap();

        assert_eq!(outcome.base_total, 7000.0);
        assert!((outcome.new_total - 10_000.0).abs() < 1e-6);
        assert!((outcome.required_cash - 3000.0).abs() < 1e-6);
        assert_eq!(outcome.binding, Some(Symbol::new("VTI")));

        let tlt = plan.line(Symbol::new("TLT")).unwrap();
        assert!((tlt.desired_value - 4000.0).abs() < 1e-6);
        assert!((tlt.deficit() - 3000.0).abs() < 1e-6);
        assert!(matches!(plan.state(), PlanState::Finalized(_)));
    }

    #[test]
    fn rebalance_overweight_stocks() {
        // VTI at 33% of 9000 against a 30% target
        let mut plan = all_weather([3000.0, 3000.0, 1500.0, 750.0, 750.0]);
        let outcome = plan.rebalance().unwrap();
        assert!((outcome.required_cash - 1000.0).abs() < 1e-6);
        for line in plan.lines() {
            assert!(line.desired_value >= line.current_value - 1e-6);
        }
    }

    #[test]
    fn rebalance_empty_portfolio() {
        let mut plan = all_weather([0.0; 5]);
        let outcome = plan.rebalance().unwrap();
        assert_eq!(outcome.required_cash, 0.0);
        assert_eq!(outcome.base_total, 0.0);
    }

    #[test]
    fn class_breakdown_in_catalog_order() {
        let policy = get_policy("Current").unwrap();
        let positions = [
            pos("VTI", 350.0),
            pos("VEA", 150.0),
            pos("VWO", 100.0),
            pos("TLT", 100.0),
            pos("IEF", 100.0),
            pos("DBC", 50.0),
            pos("GLD", 50.0),
            pos("VNQ", 100.0),
        ];
        let mut plan = AllocationPlan::build(&policy, &positions).unwrap();
        plan.compute_current_percents();

        let breakdown = plan.class_percent_breakdown();
        assert_eq!(
            breakdown,
            vec![
                (AssetClass::Equity, 0.6),
                (AssetClass::Bond, 0.2),
                (AssetClass::Commodity, 0.1),
                (AssetClass::RealEstate, 0.1),
            ]
        );
    }

    #[test]
    fn class_breakdown_skips_unknown_symbols() {
        let mut plan = AllocationPlan::from_lines(
            "Mixed",
            vec![
                AllocationLine::new(Symbol::new("VTI"), 0.5, 500.0),
                AllocationLine::new(Symbol::new("AAPL"), 0.5, 500.0),
            ],
        );
        plan.compute_current_percents();
        let breakdown = plan.class_percent_breakdown();
        assert_eq!(breakdown[0], (AssetClass::Equity, 0.5));
        let total: f64 = breakdown.iter().map(|(_, p)| p).sum();
        assert!((total - 0.5).abs() < 1e-9);
    }
}
