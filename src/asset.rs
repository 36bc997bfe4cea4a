//! Asset catalog: static reference data mapping tickers to asset classes.
//!
//! The catalog is seeded from a `'static` table and indexed once on first
//! lookup. It is never modified at runtime, so it can be read from any thread
//! without locking.

use std::fmt;
use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::types::Symbol;

/// Broad asset class, used for class-percent reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssetClass {
    Equity,
    Bond,
    Commodity,
    RealEstate,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssetClass::Equity => "Equity",
            AssetClass::Bond => "Bond",
            AssetClass::Commodity => "Commodities",
            AssetClass::RealEstate => "RealEstate",
        };
        f.pad(label)
    }
}

/// Descriptive sub-class. Carried for display only; no logic keys on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubClass {
    Domestic,
    International,
    EmergingMarkets,
    LongTermTreasury,
    MediumTermTreasury,
    InflationProtected,
    Gold,
    Index,
    Reits,
}

impl fmt::Display for SubClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubClass::Domestic => "Domestic",
            SubClass::International => "International",
            SubClass::EmergingMarkets => "Emerging Markets",
            SubClass::LongTermTreasury => "Long Term Treasury",
            SubClass::MediumTermTreasury => "Medium Term Treasury",
            SubClass::InflationProtected => "US Treasury Inflation Protected Securities",
            SubClass::Gold => "Gold",
            SubClass::Index => "Index",
            SubClass::Reits => "REITs",
        };
        f.pad(label)
    }
}

/// A known asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Asset {
    pub symbol: Symbol,
    pub class: AssetClass,
    pub sub_class: SubClass,
}

impl Asset {
    const fn new(symbol: &str, class: AssetClass, sub_class: SubClass) -> Self {
        Asset {
            symbol: Symbol::new(symbol),
            class,
            sub_class,
        }
    }
}

static KNOWN_ASSETS: &[Asset] = &[
    Asset::new("VTI", AssetClass::Equity, SubClass::Domestic),
    Asset::new("VEA", AssetClass::Equity, SubClass::International),
    Asset::new("VWO", AssetClass::Equity, SubClass::EmergingMarkets),
    Asset::new("TLT", AssetClass::Bond, SubClass::LongTermTreasury),
    Asset::new("IEF", AssetClass::Bond, SubClass::MediumTermTreasury),
    Asset::new("DBC", AssetClass::Commodity, SubClass::Index),
    Asset::new("GLD", AssetClass::Commodity, SubClass::Gold),
    Asset::new("VNQ", AssetClass::RealEstate, SubClass::Reits),
    Asset::new("VTIP", AssetClass::Bond, SubClass::InflationProtected),
    Asset::new("VGIT", AssetClass::Bond, SubClass::MediumTermTreasury),
];

static CATALOG: LazyLock<FxHashMap<Symbol, &'static Asset>> =
    LazyLock::new(|| KNOWN_ASSETS.iter().map(|a| (a.symbol, a)).collect());

static ASSET_CLASSES: [AssetClass; 4] = [
    AssetClass::Equity,
    AssetClass::Bond,
    AssetClass::Commodity,
    AssetClass::RealEstate,
];

/// Look up an asset by symbol.
pub fn lookup(symbol: Symbol) -> Result<&'static Asset> {
    CATALOG
        .get(&symbol)
        .copied()
        .ok_or(Error::NotFound { symbol })
}

/// All asset classes, in the fixed order reports use.
pub fn asset_classes() -> &'static [AssetClass] {
    &ASSET_CLASSES
}

/// Every asset in the catalog, in table order.
pub fn known_assets() -> &'static [Asset] {
    KNOWN_ASSETS
}
