//! Text and JSON rendering of run results.

use std::fmt;

use portfoli::{AllocationPlan, AssetClass, Policy, Rebalance, Symbol};
use serde::Serialize;

use crate::import::FidelityRow;

/// Per-line result of a rebalance.
#[derive(Debug, Clone, Serialize)]
pub struct LineReport {
    pub symbol: Symbol,
    pub desired_percent: f64,
    pub current_percent: f64,
    pub current_value: f64,
    pub desired_value: f64,
    pub difference: f64,
}

/// What a rebalance asks for: per-line targets and the cash to add.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub policy: String,
    pub lines: Vec<LineReport>,
    #[serde(flatten)]
    pub outcome: Rebalance,
}

impl PlanReport {
    pub fn new(plan: &AllocationPlan, outcome: Rebalance) -> Self {
        let lines = plan
            .lines()
            .iter()
            .map(|l| LineReport {
                symbol: l.symbol,
                desired_percent: l.desired_percent,
                current_percent: l.current_percent,
                current_value: l.current_value,
                desired_value: l.desired_value,
                difference: l.deficit(),
            })
            .collect();
        PlanReport {
            policy: plan.name().to_string(),
            lines,
            outcome,
        }
    }
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PLAN {}:", self.policy)?;
        writeln!(
            f,
            "  {:8} {:>8} {:>8} {:>14} {:>14} {:>14}",
            "Symbol", "Target%", "Actual%", "Current", "Desired", "Difference"
        )?;
        for l in &self.lines {
            writeln!(
                f,
                "  {:8} {:>7.2}% {:>7.0}% {:>14.2} {:>14.2} {:>+14.2}",
                l.symbol,
                l.desired_percent * 100.0,
                l.current_percent * 100.0,
                l.current_value,
                l.desired_value,
                l.difference,
            )?;
        }
        writeln!(
            f,
            "\n  Current total: ${:.2}\n  New total:     ${:.2}",
            self.outcome.base_total, self.outcome.new_total
        )?;
        if let Some(symbol) = self.outcome.binding {
            writeln!(f, "  Binding line:  {symbol}")?;
        }
        writeln!(f, "\nCash required: ${:.2}", self.outcome.required_cash)
    }
}

/// Current share of the plan per asset class.
#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    pub policy: String,
    pub classes: Vec<ClassShare>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassShare {
    pub class: AssetClass,
    pub percent: f64,
}

impl ClassReport {
    pub fn new(plan: &AllocationPlan) -> Self {
        ClassReport {
            policy: plan.name().to_string(),
            classes: plan
                .class_percent_breakdown()
                .into_iter()
                .map(|(class, percent)| ClassShare { class, percent })
                .collect(),
        }
    }
}

impl fmt::Display for ClassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ASSET CLASSES ({}):", self.policy)?;
        for c in &self.classes {
            writeln!(f, "  {:12} {:>6.0}%", c.class, c.percent * 100.0)?;
        }
        Ok(())
    }
}

/// Imported holdings, as read from the export.
#[derive(Debug, Clone, Serialize)]
pub struct PositionsReport {
    pub source: String,
    pub rows: Vec<FidelityRow>,
}

impl PositionsReport {
    pub fn total_value(&self) -> f64 {
        self.rows.iter().map(|r| r.current_value).sum()
    }
}

impl fmt::Display for PositionsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "No positions in {}.", self.source);
        }

        writeln!(f, "POSITIONS ({}):", self.source)?;
        for r in &self.rows {
            writeln!(
                f,
                "  {:12} {:8} {:>10.3} @ ${:>9.2} = ${:>12.2}",
                r.account_name, r.symbol, r.quantity, r.last_price, r.current_value,
            )?;
        }
        writeln!(f, "\n  Total: ${:.2}", self.total_value())
    }
}

/// Available policies and their targets.
#[derive(Debug, Clone, Serialize)]
pub struct PoliciesReport {
    pub policies: Vec<Policy>,
}

impl fmt::Display for PoliciesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.policies.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", p.name)?;
            for t in &p.targets {
                writeln!(f, "  {:8} {:>6.2}%", t.symbol, t.desired_percent * 100.0)?;
            }
        }
        Ok(())
    }
}
