//! # portfoli
//!
//! How much new cash does a portfolio need to get back to its target
//! allocation without selling anything?
//!
//! ## Features
//!
//! - **Asset catalog**: static symbol → asset class lookup
//! - **Policies**: named target allocations (`AllWeather`, `Swensen`, `Current`),
//!   plus user-defined ones through [`PolicyRegistry`]
//! - **Allocation plans**: current holdings merged into a policy, with
//!   current shares, desired values and per-class breakdowns
//! - **Cash-only rebalancing**: the minimum injection that brings every line to
//!   its target, keyed on the most over-allocated line
//!
//! ## Quick Start
//!
//! ```
//! use portfoli::{get_policy, AllocationPlan, Position, Symbol};
//!
//! let policy = get_policy("AllWeather").unwrap();
//! let positions = [
//!     Position::new(Symbol::new("VTI"), 3000.0),
//!     Position::new(Symbol::new("TLT"), 4000.0),
//!     Position::new(Symbol::new("IEF"), 1500.0),
//!     Position::new(Symbol::new("DBC"), 750.0),
//!     Position::new(Symbol::new("GLD"), 750.0),
//! ];
//!
//! let mut plan = AllocationPlan::build(&policy, &positions).unwrap();
//! let outcome = plan.rebalance().unwrap();
//!
//! // Already on target
//! assert_eq!(outcome.required_cash, 0.0);
//! assert_eq!(plan.required_cash(), Some(0.0));
//! ```
//!
//! ## Class Breakdown
//!
//! ```
//! use portfoli::{get_policy, AllocationPlan, AssetClass, Position, Symbol};
//!
//! let policy = get_policy("AllWeather").unwrap();
//! let positions = [
//!     Position::new(Symbol::new("VTI"), 500.0),
//!     Position::new(Symbol::new("TLT"), 500.0),
//! ];
//!
//! let mut plan = AllocationPlan::build(&policy, &positions).unwrap();
//! plan.compute_current_percents();
//!
//! let breakdown = plan.class_percent_breakdown();
//! assert_eq!(breakdown[0], (AssetClass::Equity, 0.5));
//! assert_eq!(breakdown[1], (AssetClass::Bond, 0.5));
//! ```
//!
//! ## Registries
//!
//! The asset catalog and built-in policies are immutable process-wide tables.
//! Each run builds and owns its own [`AllocationPlan`]; plans are never shared.

pub mod asset;
mod error;
pub mod plan;
pub mod policy;
mod position;
mod types;

// Re-export public API
pub use asset::{Asset, AssetClass, SubClass, asset_classes, lookup};
pub use error::{Error, Result};
pub use plan::{AllocationLine, AllocationPlan, PlanState, Rebalance};
pub use policy::{AllocationTarget, Policy, PolicyRegistry, get_policy, policy_names};
pub use position::Position;
pub use types::{SYMBOL_LEN, Symbol};
