//! Translate lines selected in the editor into comment coordinates.
//!
//! A line map goes from true line to rendered row. Comments are made on rows
//! the user sees, so the map is inverted and each selected row is resolved
//! against the nearest mapped row at or above it. Rows inside unmapped
//! regions (pure insertions) are extrapolated by their distance from that
//! anchor.

use std::collections::BTreeMap;

/// A translated comment location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRange {
    /// 1-based first line.
    pub first_line: usize,
    /// Number of lines covered, at least 1.
    pub num_lines: usize,
}

/// Translate a 1-based row into a 1-based true line.
///
/// An empty map is an identity. A row above the first anchor has nothing to
/// extrapolate from and is also returned unchanged.
pub fn to_true_line(line: usize, line_map: &BTreeMap<usize, usize>) -> usize {
    if line_map.is_empty() || line == 0 {
        return line;
    }

    let inverse: BTreeMap<usize, usize> = line_map.iter().map(|(&t, &row)| (row, t)).collect();
    let row = line - 1;
    match inverse.range(..=row).next_back() {
        Some((&anchor_row, &true_index)) => true_index + (row - anchor_row) + 1,
        None => line,
    }
}

/// Translate an inclusive selection of rows into a comment range.
pub fn comment_range(start: usize, end: usize, line_map: &BTreeMap<usize, usize>) -> CommentRange {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let first_line = to_true_line(start, line_map);
    let last_line = to_true_line(end, line_map);
    CommentRange {
        first_line,
        num_lines: last_line.saturating_sub(first_line) + 1,
    }
}
