//! Fidelity "Portfolio Positions" CSV import.
//!
//! The export has one row per holding and per account, with money columns
//! like `$1,234.56` / `-$12.00` / `+$3.10`, percent columns like `+1.25%`,
//! and `n/a` / `--` placeholders where a value doesn't apply. It ends in a
//! few lines of free-form disclaimer text.
//!
//! Row-level problems are logged and the row is skipped; only file-level
//! failures (unreadable file, broken CSV framing) are errors.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{info, warn};
use portfoli::{Position, Symbol};
use serde::Serialize;

use crate::error::{Error, Result};

/// Minimum number of columns in a holding row.
pub const ROW_LEN: usize = 14;

const NOT_APPLICABLE: &str = "n/a";
const EMPTY_MARK: &str = "--";

/// One parsed holding row.
///
/// Money amounts are in dollars; percentages are fractions (`1.25%` → `0.0125`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FidelityRow {
    pub account_name: String,
    pub symbol: Symbol,
    pub description: String,
    pub quantity: f64,
    pub last_price: f64,
    pub last_price_change: f64,
    pub current_value: f64,
    pub todays_gain_loss: f64,
    pub todays_gain_loss_pct: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_pct: f64,
    pub cost_basis_per_share: f64,
    pub cost_basis_total: f64,
    pub position_type: String,
}

impl FidelityRow {
    pub fn position(&self) -> Position {
        Position::new(self.symbol, self.current_value)
    }
}

/// A cell that couldn't be parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CellError {
    #[error("invalid amount '{0}'")]
    Amount(String),
    #[error("invalid percent '{0}'")]
    Percent(String),
}

fn is_blank(cell: &str) -> bool {
    cell.is_empty() || cell == NOT_APPLICABLE || cell == EMPTY_MARK
}

/// Parse a money cell such as `$1,234.56`, `-$12.00` or `+$3.10`.
///
/// `n/a`, `--` and empty cells are 0.
pub fn parse_currency(cell: &str) -> std::result::Result<f64, CellError> {
    let cell = cell.trim();
    if is_blank(cell) {
        return Ok(0.0);
    }
    let cleaned: String = cell.chars().filter(|c| !matches!(c, '$' | ',' | '+')).collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| CellError::Amount(cell.to_string()))
}

/// Parse a percent cell such as `+1.25%` into a fraction.
///
/// `n/a`, `--` and empty cells are 0. Anything else must end in `%`.
pub fn parse_percent(cell: &str) -> std::result::Result<f64, CellError> {
    let cell = cell.trim();
    if is_blank(cell) {
        return Ok(0.0);
    }
    let value = cell
        .strip_suffix('%')
        .ok_or_else(|| CellError::Percent(cell.to_string()))?;
    let cleaned: String = value.chars().filter(|c| !matches!(c, ',' | '+')).collect();
    cleaned
        .parse::<f64>()
        .map(|v| v / 100.0)
        .map_err(|_| CellError::Percent(cell.to_string()))
}

/// Parse a share quantity. `n/a`, `--` and empty cells are 0.
pub fn parse_quantity(cell: &str) -> std::result::Result<f64, CellError> {
    // Same shape as an amount without the currency sign
    parse_currency(cell)
}

/// Parse one CSV record. Returns `None` (after logging why) for rows that
/// aren't holdings: short rows, unusable symbols, or unparseable cells.
pub fn parse_row(record: &csv::StringRecord, line: u64) -> Option<FidelityRow> {
    if record.len() < ROW_LEN {
        if record.iter().any(|f| !f.trim().is_empty()) {
            warn!(
                "line {line}: skipping row with {} columns, expected {ROW_LEN}",
                record.len()
            );
        }
        return None;
    }

    let raw_symbol = record[1].trim().trim_end_matches('*');
    let Some(symbol) = Symbol::try_new(raw_symbol) else {
        warn!("line {line}: skipping row with unusable symbol '{}'", &record[1]);
        return None;
    };

    let parse = || -> std::result::Result<FidelityRow, (&'static str, CellError)> {
        Ok(FidelityRow {
            account_name: record[0].trim().to_string(),
            symbol,
            description: record[2].trim().to_string(),
            quantity: parse_quantity(&record[3]).map_err(|e| ("quantity", e))?,
            last_price: parse_currency(&record[4]).map_err(|e| ("last price", e))?,
            last_price_change: parse_currency(&record[5])
                .map_err(|e| ("last price change", e))?,
            current_value: parse_currency(&record[6]).map_err(|e| ("current value", e))?,
            todays_gain_loss: parse_currency(&record[7])
                .map_err(|e| ("today's gain/loss", e))?,
            todays_gain_loss_pct: parse_percent(&record[8])
                .map_err(|e| ("today's gain/loss %", e))?,
            total_gain_loss: parse_currency(&record[9]).map_err(|e| ("total gain/loss", e))?,
            total_gain_loss_pct: parse_percent(&record[10])
                .map_err(|e| ("total gain/loss %", e))?,
            cost_basis_per_share: parse_currency(&record[11])
                .map_err(|e| ("cost basis per share", e))?,
            cost_basis_total: parse_currency(&record[12])
                .map_err(|e| ("cost basis total", e))?,
            position_type: record[13].trim().to_string(),
        })
    };

    match parse() {
        Ok(row) => Some(row),
        Err((field, e)) => {
            warn!("line {line}: skipping {symbol}: {field}: {e}");
            None
        }
    }
}

/// Read every holding row from a CSV stream. The first line is the header.
pub fn read_rows<R: Read>(reader: R, path: &Path) -> Result<Vec<FidelityRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in csv_reader.byte_records() {
        let record = result.map_err(|e| Error::Import {
            path: path.to_path_buf(),
            source: e,
        })?;
        let line = record.position().map_or(0, |p| p.line());
        // Footers sometimes carry Latin-1 text; only that row is lost
        let record = match csv::StringRecord::from_byte_record(record) {
            Ok(r) => r,
            Err(e) => {
                warn!("line {line}: skipping row that is not valid UTF-8: {e}");
                skipped += 1;
                continue;
            }
        };
        match parse_row(&record, line) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }

    info!(
        "{}: imported {} rows ({skipped} skipped)",
        path.display(),
        rows.len()
    );
    Ok(rows)
}

/// A Fidelity export on disk. Parsed on demand.
#[derive(Debug, Clone)]
pub struct FidelityFile {
    path: PathBuf,
}

impl FidelityFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FidelityFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse all holding rows.
    pub fn rows(&self) -> Result<Vec<FidelityRow>> {
        let file = std::fs::File::open(&self.path).map_err(|e| Error::ImportRead {
            path: self.path.clone(),
            source: e,
        })?;
        read_rows(file, &self.path)
    }
}

/// The most recently modified regular file in `dir` whose name contains
/// `pattern`.
pub fn find_latest_export(dir: &Path, pattern: &str) -> Result<PathBuf> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::ImportRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("{}: {e}", dir.display());
                continue;
            }
        };
        if !entry.file_name().to_string_lossy().contains(pattern) {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if latest.as_ref().is_none_or(|(t, _)| modified >= *t) {
            latest = Some((modified, entry.path()));
        }
    }

    latest.map(|(_, path)| path).ok_or_else(|| Error::NoInputFile {
        dir: dir.to_path_buf(),
        pattern: pattern.to_string(),
    })
}
