//! Named target allocations ("policies") and the registry that serves them.
//!
//! Built-in policies are `'static` tables. Every policy handed out by the
//! registry has passed [`Policy::validate`], so a broken definition is
//! reported before any position data is looked at.

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::types::Symbol;

/// One line of a policy: a symbol and its target share of the portfolio.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationTarget {
    pub symbol: Symbol,
    /// Target share as a fraction in (0, 1].
    pub desired_percent: f64,
}

impl AllocationTarget {
    pub const fn new(symbol: &str, desired_percent: f64) -> Self {
        AllocationTarget {
            symbol: Symbol::new(symbol),
            desired_percent,
        }
    }
}

/// A named set of allocation targets.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Policy {
    pub name: String,
    pub targets: Vec<AllocationTarget>,
}

impl Policy {
    pub fn new(name: impl Into<String>, targets: Vec<AllocationTarget>) -> Self {
        Policy {
            name: name.into(),
            targets,
        }
    }

    /// Sum of all target shares.
    pub fn total_percent(&self) -> f64 {
        self.targets.iter().map(|t| t.desired_percent).sum()
    }

    /// Check the policy invariants.
    ///
    /// Every share must be finite and in (0, 1], symbols must be unique, and
    /// the shares must sum to 1 after rounding to the nearest integer.
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(self.invalid("no allocation targets".into()));
        }

        let mut seen = FxHashSet::default();
        for t in &self.targets {
            if !seen.insert(t.symbol) {
                return Err(self.invalid(format!("duplicate symbol {}", t.symbol)));
            }
            if !t.desired_percent.is_finite()
                || t.desired_percent <= 0.0
                || t.desired_percent > 1.0
            {
                return Err(self.invalid(format!(
                    "share for {} must be in (0, 1], got {}",
                    t.symbol, t.desired_percent
                )));
            }
        }

        let sum = self.total_percent();
        if sum.round() != 1.0 {
            return Err(self.invalid(format!(
                "allocation percentages sum to {sum:.4}, expected 1"
            )));
        }

        Ok(())
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidPolicy {
            name: self.name.clone(),
            reason,
        }
    }
}

const ALL_WEATHER: &[AllocationTarget] = &[
    AllocationTarget::new("VTI", 0.30),
    AllocationTarget::new("TLT", 0.40),
    AllocationTarget::new("IEF", 0.15),
    AllocationTarget::new("DBC", 0.075),
    AllocationTarget::new("GLD", 0.075),
];

const SWENSEN: &[AllocationTarget] = &[
    AllocationTarget::new("VTI", 0.30),
    AllocationTarget::new("VEA", 0.15),
    AllocationTarget::new("VWO", 0.05),
    AllocationTarget::new("VTIP", 0.15),
    AllocationTarget::new("VNQ", 0.20),
    AllocationTarget::new("VGIT", 0.15),
];

const CURRENT: &[AllocationTarget] = &[
    AllocationTarget::new("VTI", 0.35),
    AllocationTarget::new("VEA", 0.15),
    AllocationTarget::new("VWO", 0.10),
    AllocationTarget::new("TLT", 0.10),
    AllocationTarget::new("IEF", 0.10),
    AllocationTarget::new("DBC", 0.05),
    AllocationTarget::new("GLD", 0.05),
    AllocationTarget::new("VNQ", 0.10),
];

static BUILT_IN: &[(&str, &[AllocationTarget])] = &[
    ("AllWeather", ALL_WEATHER),
    ("Swensen", SWENSEN),
    ("Current", CURRENT),
];

/// Names of the built-in policies, in declaration order.
pub fn policy_names() -> impl Iterator<Item = &'static str> {
    BUILT_IN.iter().map(|(name, _)| *name)
}

/// Look up and validate a built-in policy.
pub fn get_policy(name: &str) -> Result<Policy> {
    let (name, targets) = BUILT_IN
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| Error::UnknownPolicy {
            name: name.to_string(),
        })?;
    let policy = Policy::new(*name, targets.to_vec());
    policy.validate()?;
    Ok(policy)
}

/// Built-in policies plus any registered at runtime (e.g. from a config file).
///
/// A registered policy shadows a built-in one of the same name.
#[derive(Clone, Debug, Default)]
pub struct PolicyRegistry {
    custom: Vec<Policy>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a policy. Later registrations win on name clashes.
    pub fn register(&mut self, policy: Policy) -> Result<()> {
        policy.validate()?;
        self.custom.retain(|p| p.name != policy.name);
        self.custom.push(policy);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Policy> {
        match self.custom.iter().find(|p| p.name == name) {
            Some(policy) => Ok(policy.clone()),
            None => get_policy(name),
        }
    }

    /// All reachable policy names: built-ins first, then registered ones.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = policy_names().collect();
        for p in &self.custom {
            if !names.contains(&p.name.as_str()) {
                names.push(&p.name);
            }
        }
        names
    }
}
