//! The master alias table: group → layer → ordered name list, plus one
//! attribute tab per source type.
//!
//! Built once from a workbook ([`parse`]), immutable afterwards; safe to
//! share read-only across parallel workers.

pub mod export;
pub mod parse;

use crate::error::Result;
use crate::workbook::Workbook;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Factor cell marker meaning "no fixed conversion factor".
pub const FACTOR_WILDCARD: &str = "-";

/// Conversion factor of one signal: fixed numeric, or free (wildcard).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Factor {
    Fixed(f64),
    Free,
}

impl Factor {
    /// Parse a factor cell. `None` means the cell is neither numeric nor
    /// the wildcard marker.
    pub fn parse(cell: &str) -> Option<Self> {
        if cell == FACTOR_WILDCARD {
            return Some(Self::Free);
        }
        cell.parse::<f64>().ok().map(Self::Fixed)
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Factor::Fixed(v) => write!(f, "{v}"),
            Factor::Free => write!(f, "{FACTOR_WILDCARD}"),
        }
    }
}

/// Per-signal attributes from a source tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub group: String,
    pub factor: Factor,
    pub units: String,
    pub description: String,
}

/// One source tab: signal name → attributes. Names are unique per tab.
pub type SourceTab = BTreeMap<String, SourceEntry>;

/// One group block of the master sheet. `rows[r][l]` is the name of row
/// `r` on the `l`-th layer of [`LookupTable::layers`]; all rows are
/// padded to the full layer count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupGroup {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupTable {
    /// Layer identifiers in master-sheet column order.
    pub layers: Vec<String>,
    /// Layer → source-type tag.
    pub source_type_of: BTreeMap<String, String>,
    pub groups: Vec<LookupGroup>,
    /// Source-type tag → attribute tab.
    pub source_tabs: BTreeMap<String, SourceTab>,
}

impl LookupTable {
    /// Load from a sheet directory; every schema violation in the source
    /// is collected and returned in one error.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let workbook = Workbook::load_dir(dir)?;
        Self::from_workbook(&workbook)
    }

    pub fn from_workbook(workbook: &Workbook) -> Result<Self> {
        parse::build(workbook)
    }

    pub fn has_layer(&self, layer: &str) -> bool {
        self.layers.iter().any(|l| l == layer)
    }

    pub fn layer_index(&self, layer: &str) -> Option<usize> {
        self.layers.iter().position(|l| l == layer)
    }

    pub fn source_type(&self, layer: &str) -> Option<&str> {
        self.source_type_of.get(layer).map(String::as_str)
    }

    /// Attributes for a signal as named on `layer`, resolved through the
    /// layer's source type.
    pub fn entry(&self, layer: &str, signal: &str) -> Option<&SourceEntry> {
        let tag = self.source_type(layer)?;
        self.source_tabs.get(tag)?.get(signal)
    }

    /// All (group, row) pairs in master order.
    pub fn rows(&self) -> impl Iterator<Item = (&LookupGroup, &[String])> {
        self.groups
            .iter()
            .flat_map(|g| g.rows.iter().map(move |r| (g, r.as_slice())))
    }

    /// Every non-empty name on one layer, master order.
    pub fn names_on_layer(&self, layer: &str) -> Vec<&str> {
        let Some(idx) = self.layer_index(layer) else {
            return Vec::new();
        };
        self.rows()
            .filter_map(|(_, row)| {
                let name = row[idx].as_str();
                if name.is_empty() { None } else { Some(name) }
            })
            .collect()
    }
}
