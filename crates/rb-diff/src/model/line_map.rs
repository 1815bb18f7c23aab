//! Line maps derived from a filediff's chunks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which file version a line number refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSide {
    /// Original file (before the change).
    Source,
    /// Patched file (after the change).
    #[default]
    Dest,
}

impl DiffSide {
    /// Buffer name prefix used by the editor shell.
    pub fn prefix(&self) -> &'static str {
        match self {
            DiffSide::Source => "SRC",
            DiffSide::Dest => "DST",
        }
    }
}

/// Zero-based mapping from true file line to rendered diff row, per side.
///
/// Sparse by construction: rows that only exist on one side of the diff have
/// no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMap {
    pub source_global_pos: BTreeMap<usize, usize>,
    pub dest_global_pos: BTreeMap<usize, usize>,
}

impl LineMap {
    pub fn side(&self, side: DiffSide) -> &BTreeMap<usize, usize> {
        match side {
            DiffSide::Source => &self.source_global_pos,
            DiffSide::Dest => &self.dest_global_pos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source_global_pos.is_empty() && self.dest_global_pos.is_empty()
    }
}

/// Everything the reconciler derives from one filediff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledDiff {
    pub line_map: LineMap,
    /// Unescaped destination text keyed by zero-based destination line.
    pub dst_updates: BTreeMap<usize, String>,
}
