//! Review session: one connected server and everything cached for it
//!
//! A `Session` is the context object the editor shell holds for the
//! lifetime of the process. Queries return plain lines or structured data
//! for the shell to display; commands change the user's draft review.
//!
//! ```text
//!  shell ──► Session ──► ReauthClient ──► CachedReviewBoardClient ──► HTTP
//!               │
//!               ├──► line_maps (MemoTable<ReconciledDiff>)
//!               └──► ContentProtocol ──► SourceControl (servers < 3.0)
//! ```

use crate::protocol::{self, ContentProtocol};
use crate::render;
use crate::source_control::{P4Fetcher, P4Settings, SourceControl};
use log::{debug, info};
use rb_api_cache::{CacheStats, MemoTable};
use rb_client::{
    CachedReviewBoardClient, ClientError, CredentialPrompt, DiffComment, DraftUpdate, FileKey,
    HttpReviewBoardClient, NewDiffComment, ReauthClient, Resource, Result, ReviewBoardClient,
    ReviewDraft, ServerVersion,
};
use rb_config::AppConfig;
use rb_diff::{build_line_map, comment_range, DiffSide, ReconciledDiff};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A review request rendered for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewRequestView {
    pub lines: Vec<String>,
    /// Destination path to filediff ID, for files of the latest diff
    pub files: HashMap<String, u64>,
    /// Revision of the latest diff, `None` while nothing was uploaded
    pub diff_revision: Option<u32>,
}

/// Both sides of one filediff with their line maps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffView {
    pub source_name: String,
    pub dest_name: String,
    /// `None` for files added by the diff
    pub source_lines: Option<Vec<String>>,
    pub dest_lines: Vec<String>,
    pub source_line_map: BTreeMap<usize, usize>,
    pub dest_line_map: BTreeMap<usize, usize>,
}

/// Which free-text field of a draft review to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyField {
    Top,
    Bottom,
}

pub struct Session {
    client: Box<dyn ReviewBoardClient>,
    protocol: Box<dyn ContentProtocol>,
    line_maps: MemoTable<ReconciledDiff>,
}

impl Session {
    /// Connect to the configured server
    ///
    /// The client stack is HTTP, then caching, then re-authentication, so a
    /// retried call still hits the cache.
    pub async fn connect(config: &AppConfig, prompt: Arc<dyn CredentialPrompt>) -> Result<Self> {
        let http = HttpReviewBoardClient::builder(&config.server_url)
            .page_size(config.page_size)
            .timeout(config.timeout())
            .connect()
            .await?;
        let source_control = Arc::new(P4Fetcher::new(P4Settings::from(config)));

        Ok(Self::from_parts(
            CachedReviewBoardClient::new(http),
            source_control,
            prompt,
        ))
    }

    /// Assemble a session from an already connected client
    pub fn from_parts<C>(
        client: C,
        source_control: Arc<dyn SourceControl>,
        prompt: Arc<dyn CredentialPrompt>,
    ) -> Self
    where
        C: ReviewBoardClient + 'static,
    {
        let protocol = protocol::select(client.server_version(), source_control);
        Self {
            client: Box::new(ReauthClient::new(client, prompt)),
            protocol,
            line_maps: MemoTable::new("line-map"),
        }
    }

    pub fn server_version(&self) -> ServerVersion {
        self.client.server_version()
    }

    pub fn line_map_stats(&self) -> CacheStats {
        self.line_maps.stats()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        self.client.login(username, password).await?;
        info!("Logged in as {}", username);
        Ok(())
    }

    /// Listing lines for one page of review requests starting at `start`
    pub async fn review_request_lines(&self, start: usize) -> Result<Vec<String>> {
        let requests = self.client.list_review_requests(start).await?;
        Ok(requests.iter().map(render::listing_line).collect())
    }

    /// Header and file list of a review request
    pub async fn review_request_view(&self, review_request_id: u64) -> Result<ReviewRequestView> {
        let request = self.client.get_review_request(review_request_id).await?;
        let diffs = self.client.get_diffs(review_request_id).await?;

        let Some(latest) = diffs.iter().max_by_key(|d| d.revision) else {
            return Ok(ReviewRequestView {
                lines: render::request_lines(&request, None),
                ..Default::default()
            });
        };

        let files = self
            .client
            .get_diff_files(review_request_id, latest.revision)
            .await?;
        Ok(ReviewRequestView {
            lines: render::request_lines(&request, Some(files.as_slice())),
            files: files.iter().map(|f| (f.dest_file.clone(), f.id)).collect(),
            diff_revision: Some(latest.revision),
        })
    }

    /// Line maps and destination text of a filediff, built once per file
    pub async fn line_map(&self, key: FileKey) -> Result<Arc<ReconciledDiff>> {
        let url = self.client.resource_url(Resource::File(key))?;
        self.line_maps
            .get_or_try_insert_with(&url, || async move {
                let file_diff = self.client.get_file_diff_meta(key).await?;
                Ok::<_, ClientError>(build_line_map(&file_diff.chunks))
            })
            .await
    }

    /// Full source and destination of a filediff
    pub async fn diff_view(&self, key: FileKey) -> Result<DiffView> {
        let files = self
            .client
            .get_diff_files(key.review_request_id, key.diff_revision)
            .await?;
        let file = files
            .into_iter()
            .find(|f| f.id == key.filediff_id)
            .ok_or_else(|| ClientError::NotFound(format!("filediff {}", key)))?;

        let reconciled = self.line_map(key).await?;
        let contents = self
            .protocol
            .file_lines(self.client.as_ref(), &file, key, &reconciled)
            .await?;
        debug!(
            "Loaded {} via {:?} protocol: {} dest lines",
            key,
            self.protocol.version(),
            contents.dest.len()
        );

        Ok(DiffView {
            source_name: format!("{}-{}", DiffSide::Source.prefix(), file.source_file),
            dest_name: format!("{}-{}", DiffSide::Dest.prefix(), file.dest_file),
            source_lines: contents.source,
            dest_lines: contents.dest,
            source_line_map: reconciled.line_map.source_global_pos.clone(),
            dest_line_map: reconciled.line_map.dest_global_pos.clone(),
        })
    }

    /// Fetch the user's draft review, creating it if there is none
    pub async fn make_review(&self, review_request_id: u64) -> Result<ReviewDraft> {
        if let Some(draft) = self.client.get_review_draft(review_request_id).await? {
            return Ok(draft);
        }
        debug!("No draft review for {}, creating one", review_request_id);
        self.client.create_review_draft(review_request_id).await
    }

    /// Comment on rows `start..=end` as displayed for `side`
    pub async fn make_comment(
        &self,
        key: FileKey,
        side: DiffSide,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<DiffComment> {
        let reconciled = self.line_map(key).await?;
        let range = comment_range(start, end, reconciled.line_map.side(side));
        debug!(
            "Rows {}-{} of {} ({:?}) are lines {}+{}",
            start, end, key, side, range.first_line, range.num_lines
        );

        let draft = self.make_review(key.review_request_id).await?;
        let comment = NewDiffComment {
            filediff_id: key.filediff_id,
            first_line: range.first_line,
            num_lines: range.num_lines,
            text: text.to_string(),
        };
        self.client
            .create_diff_comment(key.review_request_id, draft.id, &comment)
            .await
    }

    /// Draft review with its diff comments, as display lines
    pub async fn draft_review_lines(&self, review_request_id: u64) -> Result<Vec<String>> {
        let draft = self.make_review(review_request_id).await?;
        let comments = self
            .client
            .list_diff_comments(review_request_id, draft.id)
            .await?;
        Ok(render::draft_lines(&draft, &comments))
    }

    /// Replace the header or tail of the draft review
    ///
    /// Lines starting with `#` are instructions in the edit buffer and are
    /// dropped.
    pub async fn update_body(
        &self,
        review_request_id: u64,
        field: BodyField,
        text: &str,
    ) -> Result<ReviewDraft> {
        let body = render::strip_comment_lines(text);
        let update = match field {
            BodyField::Top => DraftUpdate {
                body_top: Some(body),
                ..Default::default()
            },
            BodyField::Bottom => DraftUpdate {
                body_bottom: Some(body),
                ..Default::default()
            },
        };

        let draft = self.make_review(review_request_id).await?;
        self.client
            .update_review_draft(review_request_id, draft.id, &update)
            .await
    }

    /// Publish the draft review
    pub async fn submit_review(&self, review_request_id: u64) -> Result<ReviewDraft> {
        let draft = self.make_review(review_request_id).await?;
        let update = DraftUpdate {
            public: Some(true),
            ..Default::default()
        };
        let published = self
            .client
            .update_review_draft(review_request_id, draft.id, &update)
            .await?;
        info!("Published review {} on {}", published.id, review_request_id);
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{file, lines, FakeDepot, FakeServer};
    use pretty_assertions::assert_eq;
    use rb_client::Credentials;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingPrompt {
        asked: Mutex<usize>,
    }

    impl CredentialPrompt for CountingPrompt {
        fn credentials(&self) -> Option<Credentials> {
            *self.asked.lock().unwrap() += 1;
            Some(Credentials::new("alice", "secret"))
        }
    }

    const FILE: FileKey = FileKey {
        review_request_id: 1,
        diff_revision: 2,
        filediff_id: 7,
    };

    fn depot() -> FakeDepot {
        FakeDepot::default().with_file("//depot/main/a.c", &["new", "a", "b"])
    }

    fn session(server: &FakeServer, depot: &FakeDepot) -> Session {
        Session::from_parts(
            server.clone(),
            Arc::new(depot.clone()),
            Arc::new(CountingPrompt::default()),
        )
    }

    #[tokio::test]
    async fn test_legacy_server_reads_from_source_control() {
        let server = FakeServer::new(ServerVersion::new(2, 5));
        let depot = depot();
        let session = session(&server, &depot);

        let view = session.diff_view(FILE).await.unwrap();

        assert_eq!(view.dest_lines, lines(&["new", "a", "b & c"]));
        assert_eq!(view.source_lines, Some(lines(&["new", "a", "b"])));
        assert_eq!(depot.fetches().len(), 2);
        assert_eq!(server.calls("get_full_file"), 0);
    }

    #[tokio::test]
    async fn test_modern_server_never_touches_source_control() {
        let server = FakeServer::new(ServerVersion::new(3, 5));
        let depot = depot();
        let session = session(&server, &depot);

        let view = session.diff_view(FILE).await.unwrap();

        assert_eq!(view.source_lines, Some(lines(&["a", "x", "b"])));
        assert_eq!(view.dest_lines, lines(&["new", "a", "b & c"]));
        assert!(depot.fetches().is_empty());
        assert_eq!(server.calls("get_full_file"), 1);
    }

    #[tokio::test]
    async fn test_diff_view_names_and_maps() {
        let server = FakeServer::new(ServerVersion::new(3, 0));
        let session = session(&server, &depot());

        let view = session.diff_view(FILE).await.unwrap();

        assert_eq!(view.source_name, "SRC-//depot/main/a.c");
        assert_eq!(view.dest_name, "DST-//depot/main/a.c");
        assert_eq!(view.dest_line_map, BTreeMap::from([(2, 3)]));
        assert_eq!(view.source_line_map, BTreeMap::from([(2, 3)]));
    }

    #[tokio::test]
    async fn test_new_file_has_no_source_side() {
        for version in [ServerVersion::new(2, 0), ServerVersion::new(3, 0)] {
            let server = FakeServer::new(version).with_state(|state| {
                state.files = vec![file(7, "main/a.c", "PRE-CREATION")];
            });
            let depot = depot();
            let session = session(&server, &depot);

            let view = session.diff_view(FILE).await.unwrap();

            assert_eq!(view.source_lines, None);
            assert!(!view.dest_lines.is_empty());
        }
    }

    #[tokio::test]
    async fn test_legacy_fetch_failure_propagates() {
        let server = FakeServer::new(ServerVersion::new(2, 0));
        let session = session(&server, &FakeDepot::default());

        let err = session.diff_view(FILE).await.unwrap_err();

        assert!(matches!(err, ClientError::SourceControl(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_unknown_filediff_is_not_found() {
        let server = FakeServer::new(ServerVersion::new(3, 0));
        let session = session(&server, &depot());

        let err = session
            .diff_view(FileKey::new(1, 2, 99))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_line_map_built_once_per_file() {
        let server = FakeServer::new(ServerVersion::new(3, 0));
        let session = session(&server, &depot());

        session.diff_view(FILE).await.unwrap();
        session.diff_view(FILE).await.unwrap();
        session
            .make_comment(FILE, DiffSide::Dest, 4, 4, "nit")
            .await
            .unwrap();

        assert_eq!(server.calls("get_file_diff_meta"), 1);
        assert_eq!(session.line_map_stats().misses, 1);
        assert_eq!(session.line_map_stats().hits, 2);
    }

    #[tokio::test]
    async fn test_comment_range_is_translated() {
        let server = FakeServer::new(ServerVersion::new(3, 0));
        let session = session(&server, &depot());

        // Rows 4 to 6: row 4 is the anchor of true line 3
        let comment = session
            .make_comment(FILE, DiffSide::Dest, 6, 4, "Rename this")
            .await
            .unwrap();

        assert_eq!((comment.first_line, comment.num_lines), (3, 3));
        let posted = server.state.lock().unwrap().posted.clone();
        assert_eq!(
            posted,
            vec![NewDiffComment {
                filediff_id: 7,
                first_line: 3,
                num_lines: 3,
                text: "Rename this".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_draft_is_created_once() {
        let server = FakeServer::new(ServerVersion::new(3, 0));
        let session = session(&server, &depot());

        let first = session.make_review(1).await.unwrap();
        let second = session.make_review(1).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(server.calls("create_review_draft"), 1);
        assert_eq!(server.calls("get_review_draft"), 2);
    }

    #[tokio::test]
    async fn test_update_body_strips_instructions() {
        let server = FakeServer::new(ServerVersion::new(3, 0));
        let session = session(&server, &depot());

        let draft = session
            .update_body(1, BodyField::Bottom, "# edit below\nThanks!")
            .await
            .unwrap();

        assert_eq!(draft.body_bottom, "Thanks!");
        let updates = server.state.lock().unwrap().updates.clone();
        assert_eq!(
            updates,
            vec![DraftUpdate {
                body_bottom: Some("Thanks!".to_string()),
                ..Default::default()
            }]
        );
    }

    #[tokio::test]
    async fn test_submit_publishes_draft() {
        let server = FakeServer::new(ServerVersion::new(3, 0));
        let session = session(&server, &depot());

        let draft = session.submit_review(1).await.unwrap();

        assert!(draft.public);
    }

    #[tokio::test]
    async fn test_review_request_view_uses_latest_diff() {
        let server = FakeServer::new(ServerVersion::new(3, 0));
        let session = session(&server, &depot());

        let view = session.review_request_view(1).await.unwrap();

        assert_eq!(view.diff_revision, Some(2));
        assert_eq!(view.files.get("//depot/main/a.c"), Some(&7));
        assert_eq!(view.lines.last().map(String::as_str), Some("//depot/main/a.c"));
    }

    #[tokio::test]
    async fn test_review_request_without_diffs() {
        let server = FakeServer::new(ServerVersion::new(3, 0)).with_state(|state| {
            state.diffs.clear();
        });
        let session = session(&server, &depot());

        let view = session.review_request_view(1).await.unwrap();

        assert_eq!(view.diff_revision, None);
        assert!(view.files.is_empty());
        assert_eq!(view.lines, vec!["# summary : Fix the parser"]);
        assert_eq!(server.calls("get_diff_files"), 0);
    }

    #[tokio::test]
    async fn test_listing_lines() {
        let server = FakeServer::new(ServerVersion::new(3, 0));
        let session = session(&server, &depot());

        let lines = session.review_request_lines(0).await.unwrap();

        assert_eq!(
            lines,
            vec!["      1 pending        alice  --  Fix the parser"]
        );
        assert!(session.review_request_lines(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_draft_review_lines_show_comments() {
        let server = FakeServer::new(ServerVersion::new(3, 0)).with_state(|state| {
            state.comments = vec![DiffComment {
                id: 1,
                first_line: 3,
                num_lines: 1,
                text: "nit".to_string(),
                filediff_title: Some("//depot/main/a.c (3)".to_string()),
            }];
        });
        let session = session(&server, &depot());

        let lines = session.draft_review_lines(1).await.unwrap();

        assert_eq!(
            lines,
            vec!["# header :", "", "", "# diffs :", "- //depot/main/a.c [3-4] -", "nit", ""]
        );
    }

    #[tokio::test]
    async fn test_expired_session_reauthenticates_once() {
        let server = FakeServer::new(ServerVersion::new(3, 0)).with_state(|state| {
            state.auth_failures = 1;
        });
        let prompt = Arc::new(CountingPrompt::default());
        let session = Session::from_parts(server.clone(), Arc::new(depot()), prompt.clone());

        let lines = session.review_request_lines(0).await.unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(*prompt.asked.lock().unwrap(), 1);
        assert_eq!(
            server.state.lock().unwrap().logins,
            vec![("alice".to_string(), "secret".to_string())]
        );
    }
}
