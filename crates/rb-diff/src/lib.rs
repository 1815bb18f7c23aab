//! # rb-diff
//!
//! Line-number reconciliation for Review Board diff chunks.
//!
//! Review Board renders a filediff as a list of chunks, each holding line
//! records keyed by their row in the rendered view. Editors, on the other
//! hand, show whole files. This crate bridges the two:
//!
//! - [`reconciler::build_line_map`] turns chunks into a [`ReconciledDiff`]:
//!   the per-side mapping between true file lines and rendered rows, plus the
//!   destination text of every mapped row.
//! - [`reconciler::reconstruct_destination`] overlays that text onto a raw
//!   file fetched from source control (servers older than 3.0 cannot return
//!   the patched file themselves).
//! - [`translator::to_true_line`] and [`translator::comment_range`] map a
//!   line selected by the user back to the line number the server expects
//!   for a diff comment.
//!
//! The crate does no I/O; everything here is a pure function over data
//! fetched elsewhere.
//!
//! ## Usage
//!
//! ```rust
//! use rb_diff::{parse_chunks, reconciler::build_line_map, translator::comment_range, DiffSide};
//! use serde_json::json;
//!
//! let chunks = parse_chunks(json!([
//!     { "lines": [[1, 1, "a", [], 1, "a", [], false]] }
//! ]))?;
//! let reconciled = build_line_map(&chunks);
//! let range = comment_range(1, 1, reconciled.line_map.side(DiffSide::Dest));
//! assert_eq!(range.first_line, 1);
//! # Ok::<(), rb_diff::ParseError>(())
//! ```

pub mod model;
pub mod reconciler;
pub mod translator;

use thiserror::Error;

pub use model::{parse_chunks, Chunk, DiffSide, LineMap, LineRecord, ReconciledDiff};
pub use reconciler::{build_line_map, reconstruct_destination};
pub use translator::{comment_range, to_true_line, CommentRange};

/// Errors raised while decoding a chunk payload as a whole.
///
/// A single malformed line record is never an error; it is skipped by the
/// reconciler. This type covers payloads whose overall shape is wrong.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to parse diff chunks: {0}")]
    InvalidChunks(#[from] serde_json::Error),
    #[error("Diff payload has no chunk list")]
    MissingChunks,
}
