//! Cached Review Board API client (decorator pattern)
//!
//! Wraps any `ReviewBoardClient` implementation and memoizes the two
//! read-only diff resources for the lifetime of the process:
//!
//! - the file listing of a diff revision, keyed by the diff URL
//! - each filediff with its chunks, keyed by the file URL
//!
//! Diff revisions never change once created, so neither table needs
//! invalidation. Everything else (review requests, drafts, comments) passes
//! straight through.

use crate::client::ReviewBoardClient;
use crate::error::Result;
use crate::templates::Resource;
use crate::types::{
    Diff, DiffComment, DraftUpdate, FileDiff, FileDiffSummary, FileKey, FullFile,
    NewDiffComment, ReviewDraft, ReviewRequest, ServerVersion,
};
use async_trait::async_trait;
use log::debug;
use rb_api_cache::{CacheStats, MemoTable};

/// Cached Review Board client using the decorator pattern
///
/// # Example
///
/// ```rust,ignore
/// use rb_client::{CachedReviewBoardClient, HttpReviewBoardClient};
///
/// let inner = HttpReviewBoardClient::connect("https://reviews.example.com").await?;
/// let client = CachedReviewBoardClient::new(inner);
/// ```
#[derive(Debug)]
pub struct CachedReviewBoardClient<C: ReviewBoardClient> {
    inner: C,
    diff_files: MemoTable<Vec<FileDiffSummary>>,
    file_diffs: MemoTable<FileDiff>,
}

impl<C: ReviewBoardClient> CachedReviewBoardClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            diff_files: MemoTable::new("diff-files"),
            file_diffs: MemoTable::new("filediff"),
        }
    }

    /// Hit/miss counters of the (diff listing, filediff) tables
    pub fn cache_stats(&self) -> (CacheStats, CacheStats) {
        (self.diff_files.stats(), self.file_diffs.stats())
    }
}

#[async_trait]
impl<C: ReviewBoardClient> ReviewBoardClient for CachedReviewBoardClient<C> {
    fn server_version(&self) -> ServerVersion {
        self.inner.server_version()
    }

    fn resource_url(&self, resource: Resource) -> Result<String> {
        self.inner.resource_url(resource)
    }

    async fn login(&self, username: &str, password: &str) -> Result<()> {
        self.inner.login(username, password).await
    }

    async fn list_review_requests(&self, start: usize) -> Result<Vec<ReviewRequest>> {
        self.inner.list_review_requests(start).await
    }

    async fn get_review_request(&self, review_request_id: u64) -> Result<ReviewRequest> {
        self.inner.get_review_request(review_request_id).await
    }

    async fn get_diffs(&self, review_request_id: u64) -> Result<Vec<Diff>> {
        // New revisions can be uploaded at any time
        self.inner.get_diffs(review_request_id).await
    }

    async fn get_diff_files(
        &self,
        review_request_id: u64,
        diff_revision: u32,
    ) -> Result<Vec<FileDiffSummary>> {
        let url = self.inner.resource_url(Resource::Diff {
            review_request_id,
            diff_revision,
        })?;

        let files = self
            .diff_files
            .get_or_try_insert_with(&url, || {
                self.inner.get_diff_files(review_request_id, diff_revision)
            })
            .await?;
        Ok(files.as_ref().clone())
    }

    async fn get_file_diff_meta(&self, key: FileKey) -> Result<FileDiff> {
        let url = self.inner.resource_url(Resource::File(key))?;

        let file_diff = self
            .file_diffs
            .get_or_try_insert_with(&url, || self.inner.get_file_diff_meta(key))
            .await?;
        Ok(file_diff.as_ref().clone())
    }

    async fn get_full_file(&self, key: FileKey) -> Result<FullFile> {
        debug!("Full file {} is not cached", key);
        self.inner.get_full_file(key).await
    }

    // Draft reviews are mutable - pass through to inner client without caching

    async fn get_review_draft(&self, review_request_id: u64) -> Result<Option<ReviewDraft>> {
        self.inner.get_review_draft(review_request_id).await
    }

    async fn create_review_draft(&self, review_request_id: u64) -> Result<ReviewDraft> {
        self.inner.create_review_draft(review_request_id).await
    }

    async fn update_review_draft(
        &self,
        review_request_id: u64,
        review_id: u64,
        update: &DraftUpdate,
    ) -> Result<ReviewDraft> {
        self.inner
            .update_review_draft(review_request_id, review_id, update)
            .await
    }

    async fn list_diff_comments(
        &self,
        review_request_id: u64,
        review_id: u64,
    ) -> Result<Vec<DiffComment>> {
        self.inner
            .list_diff_comments(review_request_id, review_id)
            .await
    }

    async fn create_diff_comment(
        &self,
        review_request_id: u64,
        review_id: u64,
        comment: &NewDiffComment,
    ) -> Result<DiffComment> {
        self.inner
            .create_diff_comment(review_request_id, review_id, comment)
            .await
    }
}
