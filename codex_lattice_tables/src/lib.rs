// Static lookup data for the codex lattice.
//
// Provides the cyclic tables (element names, planets, palettes, solfeggio
// frequencies, ...) and the named scaling constants that the generator
// reads through its configuration. Nothing here knows how records are
// derived; this crate only owns the data and the fixed ratio arithmetic.
//
// Architecture:
// - `types.rs`: `Scalar`, the integer/float/text cell type
// - `ratios.rs`: golden/cathedral ratios, node→gate mapping, level→frequency
// - `lib.rs` (this file): `Tables`, which loads and queries the JSON table file
//
// The tables are loaded from `data/codex_tables.json` via
// `Tables::from_json()` (JSON string in, typed struct out). The
// `default_tables()` convenience function uses `include_str!` to embed the
// default file at compile time.

pub mod ratios;
pub mod types;

pub use types::Scalar;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A loaded set of cyclic tables and scaling constants.
///
/// Both maps are `BTreeMap` so iteration order, and anything derived from
/// it, is identical on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<Scalar>>,
    #[serde(default)]
    pub constants: BTreeMap<String, f64>,
}

impl Tables {
    /// Parse tables from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// A named cyclic table, if present.
    pub fn table(&self, name: &str) -> Option<&[Scalar]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    /// A named scaling constant, if present.
    pub fn constant(&self, name: &str) -> Option<f64> {
        self.constants.get(name).copied()
    }
}

/// Load the default tables embedded at compile time.
///
/// Panics if the embedded JSON is malformed (should never happen in a
/// released build; `embedded_tables_parse` guards it).
pub fn default_tables() -> Tables {
    let json = include_str!("../../data/codex_tables.json");
    Tables::from_json(json).expect("embedded codex_tables.json is malformed")
}
