//! In-memory client used by the decorator tests

use crate::client::ReviewBoardClient;
use crate::error::{ClientError, Result};
use crate::templates::Resource;
use crate::types::{
    Diff, DiffComment, DraftUpdate, FileDiff, FileDiffSummary, FileKey, FullFile,
    NewDiffComment, ReviewDraft, ReviewRequest, ServerVersion,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock client that counts calls per operation
///
/// `auth_failures` makes the next N data calls fail with
/// `ClientError::Authorization`; `login` never resets it, so tests control
/// exactly how many retries succeed.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    pub version: ServerVersion,
    calls: Arc<Mutex<HashMap<&'static str, usize>>>,
    auth_failures: Arc<Mutex<usize>>,
}

impl MockClient {
    pub fn new(version: ServerVersion) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    pub fn failing_auth(self, times: usize) -> Self {
        *self.auth_failures.lock().unwrap() = times;
        self
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, operation: &'static str) -> Result<()> {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
        let mut failures = self.auth_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(ClientError::Authorization("session expired".to_string()));
        }
        Ok(())
    }

    pub fn summary(id: u64) -> FileDiffSummary {
        FileDiffSummary {
            id,
            source_file: format!("src/file{}.rs", id),
            dest_file: format!("src/file{}.rs", id),
            source_revision: "1".to_string(),
        }
    }
}

#[async_trait]
impl ReviewBoardClient for MockClient {
    fn server_version(&self) -> ServerVersion {
        self.version
    }

    fn resource_url(&self, resource: Resource) -> Result<String> {
        Ok(format!("mock://{:?}", resource))
    }

    async fn login(&self, _username: &str, _password: &str) -> Result<()> {
        *self.calls.lock().unwrap().entry("login").or_insert(0) += 1;
        Ok(())
    }

    async fn list_review_requests(&self, _start: usize) -> Result<Vec<ReviewRequest>> {
        self.record("list_review_requests")?;
        Ok(vec![])
    }

    async fn get_review_request(&self, review_request_id: u64) -> Result<ReviewRequest> {
        self.record("get_review_request")?;
        Ok(ReviewRequest {
            id: review_request_id,
            changenum: None,
            summary: "summary".to_string(),
            description: String::new(),
            status: "pending".to_string(),
            submitter: "alice".to_string(),
        })
    }

    async fn get_diffs(&self, _review_request_id: u64) -> Result<Vec<Diff>> {
        self.record("get_diffs")?;
        Ok(vec![Diff { id: 1, revision: 1 }])
    }

    async fn get_diff_files(
        &self,
        _review_request_id: u64,
        _diff_revision: u32,
    ) -> Result<Vec<FileDiffSummary>> {
        self.record("get_diff_files")?;
        Ok(vec![Self::summary(1), Self::summary(2)])
    }

    async fn get_file_diff_meta(&self, key: FileKey) -> Result<FileDiff> {
        self.record("get_file_diff_meta")?;
        Ok(FileDiff {
            summary: Self::summary(key.filediff_id),
            chunks: vec![],
        })
    }

    async fn get_full_file(&self, _key: FileKey) -> Result<FullFile> {
        self.record("get_full_file")?;
        Ok(FullFile::default())
    }

    async fn get_review_draft(&self, _review_request_id: u64) -> Result<Option<ReviewDraft>> {
        self.record("get_review_draft")?;
        Ok(None)
    }

    async fn create_review_draft(&self, _review_request_id: u64) -> Result<ReviewDraft> {
        self.record("create_review_draft")?;
        Ok(ReviewDraft {
            id: 1,
            ..Default::default()
        })
    }

    async fn update_review_draft(
        &self,
        _review_request_id: u64,
        review_id: u64,
        update: &DraftUpdate,
    ) -> Result<ReviewDraft> {
        self.record("update_review_draft")?;
        Ok(ReviewDraft {
            id: review_id,
            body_top: update.body_top.clone().unwrap_or_default(),
            body_bottom: update.body_bottom.clone().unwrap_or_default(),
            public: update.public.unwrap_or(false),
        })
    }

    async fn list_diff_comments(
        &self,
        _review_request_id: u64,
        _review_id: u64,
    ) -> Result<Vec<DiffComment>> {
        self.record("list_diff_comments")?;
        Ok(vec![])
    }

    async fn create_diff_comment(
        &self,
        _review_request_id: u64,
        _review_id: u64,
        comment: &NewDiffComment,
    ) -> Result<DiffComment> {
        self.record("create_diff_comment")?;
        Ok(DiffComment {
            id: 1,
            first_line: comment.first_line,
            num_lines: comment.num_lines,
            text: comment.text.clone(),
            filediff_title: None,
        })
    }
}
