//! Data structures for rendered diff chunks and the line maps derived from them.

mod chunk;
mod line_map;

pub use chunk::{parse_chunks, Chunk, LineRecord};
pub use line_map::{DiffSide, LineMap, ReconciledDiff};
