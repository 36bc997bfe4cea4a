//! Errors raised by the catalog, the policy registry, and the plan engine.

use crate::types::Symbol;

/// All errors the allocation engine can report.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// Symbol has no entry in the asset catalog.
    #[error("asset not found: {symbol}")]
    NotFound { symbol: Symbol },

    /// No policy is registered under this name.
    #[error("unknown policy '{name}'")]
    UnknownPolicy { name: String },

    /// A policy definition breaks an allocation invariant.
    #[error("invalid policy '{name}': {reason}")]
    InvalidPolicy { name: String, reason: String },

    /// A plan's target percentages don't add up to 100%.
    #[error("invalid plan '{name}': allocation percentages sum to {sum:.4}, expected 1")]
    InvalidPlan { name: String, sum: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
