//! In-memory server and source control for session tests

use crate::source_control::SourceControl;
use async_trait::async_trait;
use rb_client::{
    ClientError, Diff, DiffComment, DraftUpdate, FileDiff, FileDiffSummary, FileKey, FullFile,
    NewDiffComment, Resource, Result, ReviewBoardClient, ReviewDraft, ReviewRequest,
    ServerVersion,
};
use rb_diff::parse_chunks;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct ServerState {
    pub requests: Vec<ReviewRequest>,
    pub diffs: Vec<Diff>,
    pub files: Vec<FileDiffSummary>,
    pub file_diffs: HashMap<u64, FileDiff>,
    pub full_files: HashMap<u64, FullFile>,
    pub draft: Option<ReviewDraft>,
    pub comments: Vec<DiffComment>,
    pub posted: Vec<NewDiffComment>,
    pub updates: Vec<DraftUpdate>,
    pub auth_failures: usize,
    pub logins: Vec<(String, String)>,
    calls: HashMap<&'static str, usize>,
}

/// Fake Review Board server
#[derive(Debug, Clone)]
pub struct FakeServer {
    pub version: ServerVersion,
    pub state: Arc<Mutex<ServerState>>,
}

pub fn request(id: u64, summary: &str) -> ReviewRequest {
    ReviewRequest {
        id,
        changenum: None,
        summary: summary.to_string(),
        description: String::new(),
        status: "pending".to_string(),
        submitter: "alice".to_string(),
    }
}

pub fn file(id: u64, path: &str, source_revision: &str) -> FileDiffSummary {
    FileDiffSummary {
        id,
        source_file: format!("//depot/{}", path),
        dest_file: format!("//depot/{}", path),
        source_revision: source_revision.to_string(),
    }
}

pub fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl FakeServer {
    /// Review request 1 with one diff revision and one modified file
    ///
    /// File 7 has one changed line: true line 3 is rendered at row 4 on
    /// both sides, with `b &amp; c` as its new text. Row 1 is a pure
    /// insertion and maps nowhere.
    pub fn new(version: ServerVersion) -> Self {
        let summary = file(7, "main/a.c", "3");
        let chunks = parse_chunks(json!([{
            "change": "replace",
            "lines": [
                [1, "", "", [], 1, "new", [], false],
                [4, 3, "b", [], 3, "b &amp; c", [], false],
            ]
        }]))
        .unwrap_or_default();

        let mut state = ServerState {
            requests: vec![request(1, "Fix the parser")],
            diffs: vec![Diff { id: 1, revision: 1 }, Diff { id: 2, revision: 2 }],
            files: vec![summary.clone()],
            ..Default::default()
        };
        state.file_diffs.insert(7, FileDiff { summary, chunks });
        state.full_files.insert(
            7,
            FullFile {
                original_lines: lines(&["a", "x", "b"]),
                patched_lines: lines(&["new", "a", "b & c"]),
            },
        );

        Self {
            version,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_state(self, change: impl FnOnce(&mut ServerState)) -> Self {
        change(&mut self.state.lock().unwrap());
        self
    }

    pub fn calls(&self, operation: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.calls.get(operation).copied().unwrap_or(0)
    }

    fn record(&self, operation: &'static str) -> Result<std::sync::MutexGuard<'_, ServerState>> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(operation).or_insert(0) += 1;
        if state.auth_failures > 0 {
            state.auth_failures -= 1;
            return Err(ClientError::Authorization("session expired".to_string()));
        }
        Ok(state)
    }
}

#[async_trait]
impl ReviewBoardClient for FakeServer {
    fn server_version(&self) -> ServerVersion {
        self.version
    }

    fn resource_url(&self, resource: Resource) -> Result<String> {
        Ok(format!("fake://{:?}", resource))
    }

    async fn login(&self, username: &str, password: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .logins
            .push((username.to_string(), password.to_string()));
        Ok(())
    }

    async fn list_review_requests(&self, start: usize) -> Result<Vec<ReviewRequest>> {
        let state = self.record("list_review_requests")?;
        Ok(state.requests.iter().skip(start).cloned().collect())
    }

    async fn get_review_request(&self, review_request_id: u64) -> Result<ReviewRequest> {
        let state = self.record("get_review_request")?;
        state
            .requests
            .iter()
            .find(|r| r.id == review_request_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("review request {}", review_request_id)))
    }

    async fn get_diffs(&self, _review_request_id: u64) -> Result<Vec<Diff>> {
        let state = self.record("get_diffs")?;
        Ok(state.diffs.clone())
    }

    async fn get_diff_files(
        &self,
        _review_request_id: u64,
        _diff_revision: u32,
    ) -> Result<Vec<FileDiffSummary>> {
        let state = self.record("get_diff_files")?;
        Ok(state.files.clone())
    }

    async fn get_file_diff_meta(&self, key: FileKey) -> Result<FileDiff> {
        let state = self.record("get_file_diff_meta")?;
        state
            .file_diffs
            .get(&key.filediff_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(key.to_string()))
    }

    async fn get_full_file(&self, key: FileKey) -> Result<FullFile> {
        let state = self.record("get_full_file")?;
        state
            .full_files
            .get(&key.filediff_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(key.to_string()))
    }

    async fn get_review_draft(&self, _review_request_id: u64) -> Result<Option<ReviewDraft>> {
        let state = self.record("get_review_draft")?;
        Ok(state.draft.clone())
    }

    async fn create_review_draft(&self, _review_request_id: u64) -> Result<ReviewDraft> {
        let mut state = self.record("create_review_draft")?;
        let draft = ReviewDraft {
            id: 100,
            ..Default::default()
        };
        state.draft = Some(draft.clone());
        Ok(draft)
    }

    async fn update_review_draft(
        &self,
        _review_request_id: u64,
        review_id: u64,
        update: &DraftUpdate,
    ) -> Result<ReviewDraft> {
        let mut state = self.record("update_review_draft")?;
        state.updates.push(update.clone());
        let mut draft = state.draft.clone().unwrap_or(ReviewDraft {
            id: review_id,
            ..Default::default()
        });
        if let Some(body_top) = &update.body_top {
            draft.body_top = body_top.clone();
        }
        if let Some(body_bottom) = &update.body_bottom {
            draft.body_bottom = body_bottom.clone();
        }
        if let Some(public) = update.public {
            draft.public = public;
        }
        state.draft = Some(draft.clone());
        Ok(draft)
    }

    async fn list_diff_comments(
        &self,
        _review_request_id: u64,
        _review_id: u64,
    ) -> Result<Vec<DiffComment>> {
        let state = self.record("list_diff_comments")?;
        Ok(state.comments.clone())
    }

    async fn create_diff_comment(
        &self,
        _review_request_id: u64,
        _review_id: u64,
        comment: &NewDiffComment,
    ) -> Result<DiffComment> {
        let mut state = self.record("create_diff_comment")?;
        state.posted.push(comment.clone());
        Ok(DiffComment {
            id: state.posted.len() as u64,
            first_line: comment.first_line,
            num_lines: comment.num_lines,
            text: comment.text.clone(),
            filediff_title: None,
        })
    }
}

/// Source control serving files from a map
#[derive(Debug, Clone, Default)]
pub struct FakeDepot {
    pub files: HashMap<String, Vec<String>>,
    pub fetches: Arc<Mutex<Vec<String>>>,
}

impl FakeDepot {
    pub fn with_file(mut self, path: &str, content: &[&str]) -> Self {
        self.files.insert(path.to_string(), lines(content));
        self
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceControl for FakeDepot {
    async fn fetch_file(&self, path: &str) -> Result<Vec<String>> {
        self.fetches.lock().unwrap().push(path.to_string());
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ClientError::SourceControl(format!("no such file {}", path)))
    }
}
