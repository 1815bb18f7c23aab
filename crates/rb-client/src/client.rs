//! Review Board client trait
//!
//! This module defines the core `ReviewBoardClient` trait that the direct HTTP
//! client and all decorators implement.

use crate::error::Result;
use crate::templates::Resource;
use crate::types::{
    Diff, DiffComment, DraftUpdate, FileDiff, FileDiffSummary, FileKey, FullFile,
    NewDiffComment, ReviewDraft, ReviewRequest, ServerVersion,
};
use async_trait::async_trait;

/// Review Board API client trait
///
/// Defines the interface for talking to a Review Board server.
/// Implementations can be direct (hitting the API) or decorated
/// with caching or re-authentication.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one client can be shared by
/// reference for the whole session.
///
/// # Example
///
/// ```rust,ignore
/// use rb_client::{ReviewBoardClient, ReviewRequest};
///
/// async fn first_page(client: &dyn ReviewBoardClient) -> rb_client::Result<Vec<ReviewRequest>> {
///     client.list_review_requests(0).await
/// }
/// ```
#[async_trait]
pub trait ReviewBoardClient: Send + Sync {
    /// Server version detected when connecting
    fn server_version(&self) -> ServerVersion;

    /// Absolute URL of a resource, built from the server's URI templates
    ///
    /// Decorators use this as their cache key.
    fn resource_url(&self, resource: Resource) -> Result<String>;

    /// Log in with a username and password
    ///
    /// Subsequent requests reuse the resulting session.
    async fn login(&self, username: &str, password: &str) -> Result<()>;

    /// Fetch one page of review requests
    ///
    /// # Arguments
    ///
    /// * `start` - Offset of the first review request on the page
    async fn list_review_requests(&self, start: usize) -> Result<Vec<ReviewRequest>>;

    /// Fetch a single review request by ID
    async fn get_review_request(&self, review_request_id: u64) -> Result<ReviewRequest>;

    /// Fetch all diff revisions of a review request, oldest first
    async fn get_diffs(&self, review_request_id: u64) -> Result<Vec<Diff>>;

    /// Fetch the file listing of one diff revision
    async fn get_diff_files(
        &self,
        review_request_id: u64,
        diff_revision: u32,
    ) -> Result<Vec<FileDiffSummary>>;

    /// Fetch a filediff together with its rendered chunks
    async fn get_file_diff_meta(&self, key: FileKey) -> Result<FileDiff>;

    /// Fetch the full original and patched file
    ///
    /// Only servers >= 3.0 support this; older servers yield
    /// `ClientError::UnsupportedProtocol`.
    async fn get_full_file(&self, key: FileKey) -> Result<FullFile>;

    /// Fetch the current user's draft review, if one exists
    async fn get_review_draft(&self, review_request_id: u64) -> Result<Option<ReviewDraft>>;

    /// Create a new draft review
    async fn create_review_draft(&self, review_request_id: u64) -> Result<ReviewDraft>;

    /// Change fields of a draft review (publishing it when `public` is set)
    async fn update_review_draft(
        &self,
        review_request_id: u64,
        review_id: u64,
        update: &DraftUpdate,
    ) -> Result<ReviewDraft>;

    /// Fetch the diff comments of a review
    async fn list_diff_comments(
        &self,
        review_request_id: u64,
        review_id: u64,
    ) -> Result<Vec<DiffComment>>;

    /// Add a diff comment to a review
    async fn create_diff_comment(
        &self,
        review_request_id: u64,
        review_id: u64,
        comment: &NewDiffComment,
    ) -> Result<DiffComment>;
}
