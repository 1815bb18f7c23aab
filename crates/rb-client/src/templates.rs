//! Server-supplied URI templates
//!
//! The API root advertises a map of named templates such as
//! `http://rb/api/review-requests/{review_request_id}/`. Endpoint shapes are
//! never hard-coded beyond the three templates the client depends on; the
//! remaining resources are reached relative to those.

use crate::error::{ClientError, Result};
use crate::types::FileKey;
use std::collections::HashMap;

/// A resource the client knows how to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    ReviewRequest { review_request_id: u64 },
    Diffs { review_request_id: u64 },
    Diff { review_request_id: u64, diff_revision: u32 },
    DiffFiles { review_request_id: u64, diff_revision: u32 },
    File(FileKey),
    OriginalFile(FileKey),
    PatchedFile(FileKey),
    Reviews { review_request_id: u64 },
    ReviewDraft { review_request_id: u64 },
    Review { review_request_id: u64, review_id: u64 },
    DiffComments { review_request_id: u64, review_id: u64 },
}

/// Named URI templates from the API root
#[derive(Debug, Clone, Default)]
pub struct UriTemplates {
    templates: HashMap<String, String>,
}

impl UriTemplates {
    pub const REVIEW_REQUEST: &'static str = "review_request";
    pub const DIFF: &'static str = "diff";
    pub const FILE: &'static str = "file";

    pub fn new(templates: HashMap<String, String>) -> Self {
        Self { templates }
    }

    /// Expand a named template, treating it as an opaque format string
    ///
    /// Every `{name}` placeholder must be supplied; leftover placeholders are
    /// an error rather than being sent to the server verbatim.
    pub fn expand(&self, name: &str, values: &[(&str, String)]) -> Result<String> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| ClientError::Template(format!("server has no '{}' template", name)))?;

        let mut url = template.clone();
        for (key, value) in values {
            url = url.replace(&format!("{{{}}}", key), value);
        }

        if let Some(start) = url.find('{') {
            let rest = &url[start..];
            let placeholder = rest.find('}').map_or(rest, |end| &rest[..=end]);
            return Err(ClientError::Template(format!(
                "unfilled placeholder {} in '{}' template",
                placeholder, name
            )));
        }
        Ok(url)
    }

    /// Build the URL of a resource
    pub fn url_for(&self, resource: Resource) -> Result<String> {
        match resource {
            Resource::ReviewRequest { review_request_id } => self.expand(
                Self::REVIEW_REQUEST,
                &[("review_request_id", review_request_id.to_string())],
            ),
            Resource::Diffs { review_request_id } => Ok(join(
                &self.url_for(Resource::ReviewRequest { review_request_id })?,
                "diffs/",
            )),
            Resource::Diff {
                review_request_id,
                diff_revision,
            } => self.expand(
                Self::DIFF,
                &[
                    ("review_request_id", review_request_id.to_string()),
                    ("diff_revision", diff_revision.to_string()),
                ],
            ),
            Resource::DiffFiles {
                review_request_id,
                diff_revision,
            } => Ok(join(
                &self.url_for(Resource::Diff {
                    review_request_id,
                    diff_revision,
                })?,
                "files/",
            )),
            Resource::File(key) => self.expand(
                Self::FILE,
                &[
                    ("review_request_id", key.review_request_id.to_string()),
                    ("diff_revision", key.diff_revision.to_string()),
                    ("filediff_id", key.filediff_id.to_string()),
                ],
            ),
            Resource::OriginalFile(key) => {
                Ok(join(&self.url_for(Resource::File(key))?, "original-file/"))
            }
            Resource::PatchedFile(key) => {
                Ok(join(&self.url_for(Resource::File(key))?, "patched-file/"))
            }
            Resource::Reviews { review_request_id } => Ok(join(
                &self.url_for(Resource::ReviewRequest { review_request_id })?,
                "reviews/",
            )),
            Resource::ReviewDraft { review_request_id } => Ok(join(
                &self.url_for(Resource::Reviews { review_request_id })?,
                "draft/",
            )),
            Resource::Review {
                review_request_id,
                review_id,
            } => Ok(join(
                &self.url_for(Resource::Reviews { review_request_id })?,
                &format!("{}/", review_id),
            )),
            Resource::DiffComments {
                review_request_id,
                review_id,
            } => Ok(join(
                &self.url_for(Resource::Review {
                    review_request_id,
                    review_id,
                })?,
                "diff-comments/",
            )),
        }
    }
}

fn join(base: &str, segment: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, segment)
    } else {
        format!("{}/{}", base, segment)
    }
}
