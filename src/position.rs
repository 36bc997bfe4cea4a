//! Current holdings as seen by the plan engine.

use crate::types::Symbol;

/// Market value currently held in one symbol.
///
/// Produced by an importer; the plan engine only reads it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub symbol: Symbol,
    pub current_value: f64,
}

impl Position {
    pub fn new(symbol: Symbol, current_value: f64) -> Self {
        Position {
            symbol,
            current_value,
        }
    }
}
