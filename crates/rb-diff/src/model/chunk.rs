//! Rendered diff chunks as returned by the Review Board diff viewer API.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A contiguous block of lines in a rendered filediff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Raw line records. Kept as JSON values because the server mixes
    /// integers, empty strings and nested arrays in the same record.
    #[serde(default)]
    pub lines: Vec<Value>,
}

/// Decode a chunk list from either a bare array or an object holding a
/// `chunks` field (the two shapes different server versions send).
pub fn parse_chunks(value: Value) -> Result<Vec<Chunk>, ParseError> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(mut map) => match map.remove("chunks") {
            Some(chunks) => Ok(serde_json::from_value(chunks)?),
            None => Err(ParseError::MissingChunks),
        },
        _ => Err(ParseError::MissingChunks),
    }
}

/// One fully numbered line record.
///
/// The wire layout is
/// `[row, src_line, src_text, src_ranges, dst_line, dst_text, dst_ranges, ws_only]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    /// 1-based row in the rendered diff view.
    pub row: usize,
    /// 1-based line in the source file.
    pub source_line: usize,
    /// 1-based line in the destination file, `None` for pure deletions.
    pub dest_line: Option<usize>,
    /// Destination text, still HTML-escaped.
    pub dest_text: String,
}

impl LineRecord {
    const ROW: usize = 0;
    const SRC_LINE: usize = 1;
    const DST_LINE: usize = 4;
    const DST_TEXT: usize = 5;

    /// Parse a raw record.
    ///
    /// Returns `None` when the row or source line is missing or not a positive
    /// integer, which drops pure insertions (`""` as source line). Pure
    /// deletions carry `""` as destination line and keep their source anchor.
    pub fn parse(value: &Value) -> Option<Self> {
        let fields = value.as_array()?;
        Some(Self {
            row: line_number(fields.get(Self::ROW)?)?,
            source_line: line_number(fields.get(Self::SRC_LINE)?)?,
            dest_line: fields.get(Self::DST_LINE).and_then(line_number),
            dest_text: fields
                .get(Self::DST_TEXT)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

fn line_number(value: &Value) -> Option<usize> {
    let n = match value {
        Value::Number(n) => usize::try_from(n.as_u64()?).ok()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (n > 0).then_some(n)
}
