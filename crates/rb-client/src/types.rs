//! Review Board API data transfer objects
//!
//! These types represent the data the client hands out. They are decoupled
//! from the raw wire payloads (see `http_client`) so mocks and decorators can
//! produce them without going through JSON.

use rb_diff::Chunk;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one file of one diff revision of a review request
///
/// Diff revisions are immutable on the server, which makes this triple a
/// stable cache key for anything derived from the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileKey {
    pub review_request_id: u64,
    pub diff_revision: u32,
    pub filediff_id: u64,
}

impl FileKey {
    pub fn new(review_request_id: u64, diff_revision: u32, filediff_id: u64) -> Self {
        Self {
            review_request_id,
            diff_revision,
            filediff_id,
        }
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "r{}/d{}/f{}",
            self.review_request_id, self.diff_revision, self.filediff_id
        )
    }
}

/// Review Board server version as reported by the API root
///
/// Only `major.minor` matter for protocol selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
}

impl ServerVersion {
    /// First version that serves full original/patched files.
    pub const FULL_FILES: ServerVersion = ServerVersion::new(3, 0);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse a `product.version` string such as `"2.0.5 alpha 2"`.
    ///
    /// Only the first whitespace-separated token is considered; its first two
    /// dot-separated components must be integers. Anything else yields `0.0`.
    pub fn parse(raw: &str) -> Self {
        let Some(token) = raw.split_whitespace().next() else {
            return Self::default();
        };
        let mut parts = token.split('.');
        let major = parts.next().and_then(|p| p.parse().ok());
        let minor = parts.next().map_or(Some(0), |p| p.parse().ok());
        match (major, minor) {
            (Some(major), Some(minor)) => Self::new(major, minor),
            _ => Self::default(),
        }
    }

    /// The protocol family this server speaks
    pub fn protocol(&self) -> ProtocolVersion {
        if *self >= Self::FULL_FILES {
            ProtocolVersion::Modern
        } else {
            ProtocolVersion::Legacy
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Protocol families with different ways of serving diff data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// Before 3.0: chunks are embedded in the file resource and full files
    /// must come from source control.
    Legacy,
    /// 3.0 and later: diff data has its own mimetype and the server returns
    /// original and patched files.
    Modern,
}

/// A review request summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Review request ID
    pub id: u64,

    /// Source control change number, if any
    pub changenum: Option<u64>,

    /// One-line summary
    pub summary: String,

    /// Long description
    pub description: String,

    /// "pending", "submitted" or "discarded"
    pub status: String,

    /// Submitter's username
    pub submitter: String,
}

/// One diff revision of a review request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    pub id: u64,
    pub revision: u32,
}

/// One entry of a diff's file listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiffSummary {
    pub id: u64,
    pub source_file: String,
    pub dest_file: String,
    /// Source revision; `PRE-CREATION` for newly added files
    pub source_revision: String,
}

impl FileDiffSummary {
    pub const PRE_CREATION: &'static str = "PRE-CREATION";

    /// Whether the file did not exist before the change
    pub fn is_new_file(&self) -> bool {
        self.source_revision == Self::PRE_CREATION
    }
}

/// A filediff with its rendered chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDiff {
    pub summary: FileDiffSummary,
    pub chunks: Vec<Chunk>,
}

/// Full original and patched contents of a file (servers >= 3.0)
///
/// A side that does not exist (added or deleted file) is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FullFile {
    pub original_lines: Vec<String>,
    pub patched_lines: Vec<String>,
}

/// The current user's unpublished review of a review request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub id: u64,
    pub body_top: String,
    pub body_bottom: String,
    pub public: bool,
}

/// Fields to change on a draft review; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftUpdate {
    pub body_top: Option<String>,
    pub body_bottom: Option<String>,
    pub public: Option<bool>,
}

impl DraftUpdate {
    /// Form fields for the PUT request
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(body_top) = &self.body_top {
            fields.push(("body_top", body_top.clone()));
        }
        if let Some(body_bottom) = &self.body_bottom {
            fields.push(("body_bottom", body_bottom.clone()));
        }
        if let Some(public) = self.public {
            fields.push(("public", if public { "1" } else { "0" }.to_string()));
        }
        fields
    }
}

/// A comment attached to a line range of a filediff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffComment {
    pub id: u64,
    pub first_line: usize,
    pub num_lines: usize,
    pub text: String,
    /// Title of the linked filediff (usually "path (revision)")
    pub filediff_title: Option<String>,
}

impl DiffComment {
    /// Last line covered, never below zero for an empty range
    pub fn last_line(&self) -> usize {
        (self.first_line + self.num_lines).saturating_sub(1)
    }
}

/// A diff comment to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiffComment {
    pub filediff_id: u64,
    /// 1-based first line in the true file
    pub first_line: usize,
    pub num_lines: usize,
    pub text: String,
}

impl NewDiffComment {
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("filediff_id", self.filediff_id.to_string()),
            ("first_line", self.first_line.to_string()),
            ("num_lines", self.num_lines.to_string()),
            ("text", self.text.clone()),
        ]
    }
}

/// Username and password supplied by the shell
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
