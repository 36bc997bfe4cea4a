//! Run orchestration: policy → positions → plan → report.
//!
//! The policy is always resolved (and validated) before any position data is
//! read, so a bad policy name fails fast regardless of the input file.

use std::path::PathBuf;

use log::info;
use portfoli::{AllocationPlan, Policy};

use crate::config::Config;
use crate::error::Result;
use crate::import::{self, FidelityFile};
use crate::report::{ClassReport, PlanReport, PoliciesReport, PositionsReport};
use crate::source::PositionSource;

/// Pick the export to read: explicit path, then config, then the newest
/// matching file in the downloads directory.
pub fn resolve_input(config: &Config, input: Option<PathBuf>) -> Result<FidelityFile> {
    if let Some(path) = input.or_else(|| config.input.path.clone()) {
        return Ok(FidelityFile::new(path));
    }

    let dir = config.downloads_dir()?;
    let path = import::find_latest_export(&dir, &config.input.file_pattern)?;
    info!("Using default Fidelity export {}", path.display());
    Ok(FidelityFile::new(path))
}

/// Look up a policy by name, falling back to the configured default.
pub fn resolve_policy(config: &Config, name: Option<&str>) -> Result<Policy> {
    let name = name.unwrap_or(&config.plan.policy);
    Ok(config.registry()?.get(name)?)
}

/// Build a plan for `policy` from the source's holdings.
fn build_plan(policy: &Policy, source: &dyn PositionSource) -> Result<AllocationPlan> {
    let positions = source.positions()?;
    Ok(AllocationPlan::build(policy, &positions)?)
}

/// Rebalance and report the cash needed to reach the policy without selling.
pub fn cash_report(policy: &Policy, source: &dyn PositionSource) -> Result<PlanReport> {
    let mut plan = build_plan(policy, source)?;
    let outcome = plan.rebalance()?;
    info!(
        "{}: {:.2} required on top of {:.2}",
        policy.name, outcome.required_cash, outcome.base_total
    );
    Ok(PlanReport::new(&plan, outcome))
}

/// Current holdings broken down by asset class.
pub fn class_report(policy: &Policy, source: &dyn PositionSource) -> Result<ClassReport> {
    let mut plan = build_plan(policy, source)?;
    plan.validate()?;
    plan.compute_current_percents();
    Ok(ClassReport::new(&plan))
}

/// Every reachable policy, built-ins first.
pub fn policies_report(config: &Config) -> Result<PoliciesReport> {
    let registry = config.registry()?;
    let policies = registry
        .names()
        .into_iter()
        .map(|name| registry.get(name))
        .collect::<portfoli::Result<Vec<_>>>()?;
    Ok(PoliciesReport { policies })
}

/// Rows of an export as imported.
pub fn positions_report(file: &FidelityFile) -> Result<PositionsReport> {
    Ok(PositionsReport {
        source: file.path().display().to_string(),
        rows: file.rows()?,
    })
}
