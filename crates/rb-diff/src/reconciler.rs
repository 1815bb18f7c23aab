//! Build line maps from rendered chunks and rebuild destination files.

use crate::model::{Chunk, LineRecord, ReconciledDiff};
use log::debug;
use std::collections::BTreeMap;

/// Derive the per-side line maps and destination text from a filediff's chunks.
///
/// Records without a row or source line (insertions, garbage) are skipped one
/// at a time; the rest of the chunk is still processed. Deletions still anchor
/// the source map but add nothing on the destination side.
pub fn build_line_map(chunks: &[Chunk]) -> ReconciledDiff {
    let mut reconciled = ReconciledDiff::default();
    let mut skipped = 0usize;

    for chunk in chunks {
        for raw in &chunk.lines {
            let Some(record) = LineRecord::parse(raw) else {
                skipped += 1;
                continue;
            };

            let row = record.row - 1;
            reconciled
                .line_map
                .source_global_pos
                .insert(record.source_line - 1, row);

            let Some(dest_line) = record.dest_line else {
                continue;
            };
            let dest = dest_line - 1;
            reconciled.line_map.dest_global_pos.insert(dest, row);
            reconciled.dst_updates.insert(
                dest,
                html_escape::decode_html_entities(&record.dest_text).into_owned(),
            );
        }
    }

    debug!(
        "Built line map: {} source / {} dest entries, {} records skipped",
        reconciled.line_map.source_global_pos.len(),
        reconciled.line_map.dest_global_pos.len(),
        skipped
    );
    reconciled
}

/// Overlay destination text onto a raw file fetched from source control.
///
/// Pure overwrite by zero-based index: no lines are inserted or removed, so the
/// raw file must already have the same line count as the diff's destination.
/// Updates pointing past the end of the raw file are dropped.
pub fn reconstruct_destination(
    mut raw_dest_lines: Vec<String>,
    dst_updates: &BTreeMap<usize, String>,
) -> Vec<String> {
    let mut dropped = 0usize;
    for (&index, text) in dst_updates {
        match raw_dest_lines.get_mut(index) {
            Some(line) => line.clone_from(text),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(
            "{} destination updates fell outside a {}-line file",
            dropped,
            raw_dest_lines.len()
        );
    }
    raw_dest_lines
}
