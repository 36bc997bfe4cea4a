//! Position source abstraction used by the rebalancer runs.

use portfoli::Position;

use crate::error::Result;
use crate::import::FidelityFile;

/// Minimal holdings API needed by a run: current value per symbol.
pub trait PositionSource {
    fn positions(&self) -> Result<Vec<Position>>;
}

impl PositionSource for FidelityFile {
    fn positions(&self) -> Result<Vec<Position>> {
        Ok(self.rows()?.iter().map(|r| r.position()).collect())
    }
}

/// Fixed positions held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticPositions(pub Vec<Position>);

impl PositionSource for StaticPositions {
    fn positions(&self) -> Result<Vec<Position>> {
        Ok(self.0.clone())
    }
}
