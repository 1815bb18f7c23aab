//! reqwest-based Review Board API client
//!
//! Direct implementation of the `ReviewBoardClient` trait. This client makes
//! real HTTP calls without any caching or re-authentication; wrap it with
//! `CachedReviewBoardClient` and `ReauthClient` for that.

use crate::client::ReviewBoardClient;
use crate::error::{ClientError, Result};
use crate::templates::{Resource, UriTemplates};
use crate::types::{
    Credentials, Diff, DiffComment, DraftUpdate, FileDiff, FileDiffSummary, FileKey, FullFile,
    NewDiffComment, ProtocolVersion, ReviewDraft, ReviewRequest, ServerVersion,
};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use url::Url;

/// Mimetype that makes a 3.0+ server return rendered chunks for a filediff
pub const DIFF_DATA_MIMETYPE: &str = "application/vnd.reviewboard.org.diff.data+json";

const DEFAULT_PAGE_SIZE: usize = 25;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const FILES_PAGE_SIZE: usize = 200;

/// Builder for [`HttpReviewBoardClient`]
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    base_url: String,
    page_size: usize,
    timeout: Duration,
}

impl HttpClientBuilder {
    /// Number of review requests per listing page (`max-results`)
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Connect to the server
    ///
    /// Fetches the API root once to learn the server version and the URI
    /// templates. An unparsable version is treated as `0.0`; an unreachable
    /// server is a `ClientError::Connection`.
    pub async fn connect(self) -> Result<HttpReviewBoardClient> {
        let api_root = api_root(&self.base_url)?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .build()
            .map_err(ClientError::from_transport)?;

        let mut client = HttpReviewBoardClient {
            http,
            api_root,
            version: ServerVersion::default(),
            templates: UriTemplates::default(),
            page_size: self.page_size,
            credentials: RwLock::new(None),
        };

        let root: Value = client.get_json(client.api_root.as_str()).await?;
        client.version = root
            .pointer("/product/version")
            .and_then(Value::as_str)
            .map(ServerVersion::parse)
            .unwrap_or_default();
        client.templates = UriTemplates::new(
            root.get("uri_templates")
                .cloned()
                .and_then(|t| serde_json::from_value::<HashMap<String, String>>(t).ok())
                .unwrap_or_default(),
        );

        info!(
            "Connected to {} (Review Board {}, {:?} protocol)",
            client.api_root,
            client.version,
            client.version.protocol()
        );
        Ok(client)
    }
}

/// Direct Review Board API client
///
/// This is the base implementation that makes actual API calls.
#[derive(Debug)]
pub struct HttpReviewBoardClient {
    http: reqwest::Client,
    api_root: Url,
    version: ServerVersion,
    templates: UriTemplates,
    page_size: usize,
    credentials: RwLock<Option<Credentials>>,
}

impl HttpReviewBoardClient {
    /// Start building a client for the server at `base_url`
    ///
    /// ```rust,no_run
    /// # async fn example() -> rb_client::Result<()> {
    /// let client = rb_client::HttpReviewBoardClient::builder("https://reviews.example.com")
    ///     .page_size(50)
    ///     .connect()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder(base_url: &str) -> HttpClientBuilder {
        HttpClientBuilder {
            base_url: base_url.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Connect with default settings
    pub async fn connect(base_url: &str) -> Result<Self> {
        Self::builder(base_url).connect().await
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        self.api_root
            .join(path)
            .map_err(|e| ClientError::Template(format!("bad API path '{}': {}", path, e)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.read().unwrap().as_ref() {
            Some(creds) => request.basic_auth(&creds.username, Some(&creds.password)),
            None => request,
        }
    }

    /// Send a request and map non-success statuses to error kinds
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = self.authorize(request);
        let response = request.send().await.map_err(ClientError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        let message = server_error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        debug!("{} failed with {}: {}", url, status, message);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Authorization(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(url),
            _ => ClientError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let body = response.text().await.map_err(ClientError::from_transport)?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.fetch_json(self.http.get(url)).await
    }

    /// Raw text of a file resource; a missing file reads as empty
    async fn get_file_text(&self, url: &str) -> Result<String> {
        match self.send(self.http.get(url)).await {
            Ok(response) => response.text().await.map_err(ClientError::from_transport),
            Err(ClientError::NotFound(_)) => {
                debug!("{} does not exist on this side of the diff", url);
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ReviewBoardClient for HttpReviewBoardClient {
    fn server_version(&self) -> ServerVersion {
        self.version
    }

    fn resource_url(&self, resource: Resource) -> Result<String> {
        self.templates.url_for(resource)
    }

    async fn login(&self, username: &str, password: &str) -> Result<()> {
        *self.credentials.write().unwrap() = Some(Credentials::new(username, password));

        let url = self.api_url("session/")?;
        match self.send(self.http.get(url)).await {
            Ok(_) => {
                info!("Logged in as {}", username);
                Ok(())
            }
            Err(e) => {
                *self.credentials.write().unwrap() = None;
                Err(e)
            }
        }
    }

    async fn list_review_requests(&self, start: usize) -> Result<Vec<ReviewRequest>> {
        debug!("Fetching review requests starting at {}", start);
        let url = self.api_url("review-requests/")?;
        let request = self.http.get(url).query(&[
            ("start", start.to_string()),
            ("max-results", self.page_size.to_string()),
        ]);
        let page: ReviewRequestList = self.fetch_json(request).await?;
        Ok(page.review_requests.into_iter().map(Into::into).collect())
    }

    async fn get_review_request(&self, review_request_id: u64) -> Result<ReviewRequest> {
        let url = self.resource_url(Resource::ReviewRequest { review_request_id })?;
        let payload: ReviewRequestItem = self.get_json(&url).await?;
        Ok(payload.review_request.into())
    }

    async fn get_diffs(&self, review_request_id: u64) -> Result<Vec<Diff>> {
        let url = self.resource_url(Resource::Diffs { review_request_id })?;
        let payload: DiffList = self.get_json(&url).await?;
        let mut diffs = payload.diffs;
        diffs.sort_by_key(|d| d.revision);
        Ok(diffs)
    }

    async fn get_diff_files(
        &self,
        review_request_id: u64,
        diff_revision: u32,
    ) -> Result<Vec<FileDiffSummary>> {
        let url = self.resource_url(Resource::DiffFiles {
            review_request_id,
            diff_revision,
        })?;

        let mut files = Vec::new();
        loop {
            let request = self.http.get(&url).query(&[
                ("start", files.len().to_string()),
                ("max-results", FILES_PAGE_SIZE.to_string()),
            ]);
            let page: FileList = self.fetch_json(request).await?;
            let page_len = page.files.len();
            files.extend(page.files.into_iter().map(FileDiffSummary::from));

            let total = page.total_results.unwrap_or(files.len());
            if page_len == 0 || files.len() >= total {
                break;
            }
        }

        debug!(
            "Fetched {} files for review request {} diff {}",
            files.len(),
            review_request_id,
            diff_revision
        );
        Ok(files)
    }

    async fn get_file_diff_meta(&self, key: FileKey) -> Result<FileDiff> {
        let url = self.resource_url(Resource::File(key))?;
        debug!("Fetching filediff {} from {}", key, url);

        let payload: FileItem = self.get_json(&url).await?;
        let summary: RawFile = serde_json::from_value(payload.file.clone())?;

        let chunks = match self.version.protocol() {
            ProtocolVersion::Legacy => rb_diff::parse_chunks(payload.file)?,
            ProtocolVersion::Modern => {
                let request = self.http.get(&url).header(ACCEPT, DIFF_DATA_MIMETYPE);
                let data: DiffDataItem = self.fetch_json(request).await?;
                rb_diff::parse_chunks(data.diff_data)?
            }
        };

        Ok(FileDiff {
            summary: summary.into(),
            chunks,
        })
    }

    async fn get_full_file(&self, key: FileKey) -> Result<FullFile> {
        if self.version.protocol() != ProtocolVersion::Modern {
            return Err(ClientError::UnsupportedProtocol {
                required: format!(">= {}", ServerVersion::FULL_FILES),
                actual: self.version.to_string(),
            });
        }

        let original = self
            .get_file_text(&self.resource_url(Resource::OriginalFile(key))?)
            .await?;
        let patched = self
            .get_file_text(&self.resource_url(Resource::PatchedFile(key))?)
            .await?;

        Ok(FullFile {
            original_lines: split_lines(&original),
            patched_lines: split_lines(&patched),
        })
    }

    async fn get_review_draft(&self, review_request_id: u64) -> Result<Option<ReviewDraft>> {
        let url = self.resource_url(Resource::ReviewDraft { review_request_id })?;
        match self.get_json::<ReviewItem>(&url).await {
            Ok(payload) => Ok(Some(payload.review.into())),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_review_draft(&self, review_request_id: u64) -> Result<ReviewDraft> {
        let url = self.resource_url(Resource::Reviews { review_request_id })?;
        debug!("Creating draft review for review request {}", review_request_id);
        let empty: [(&str, &str); 0] = [];
        let payload: ReviewItem = self.fetch_json(self.http.post(&url).form(&empty)).await?;
        Ok(payload.review.into())
    }

    async fn update_review_draft(
        &self,
        review_request_id: u64,
        review_id: u64,
        update: &DraftUpdate,
    ) -> Result<ReviewDraft> {
        let url = self.resource_url(Resource::Review {
            review_request_id,
            review_id,
        })?;
        let payload: ReviewItem = self
            .fetch_json(self.http.put(&url).form(&update.form_fields()))
            .await?;
        Ok(payload.review.into())
    }

    async fn list_diff_comments(
        &self,
        review_request_id: u64,
        review_id: u64,
    ) -> Result<Vec<DiffComment>> {
        let url = self.resource_url(Resource::DiffComments {
            review_request_id,
            review_id,
        })?;
        let request = self
            .http
            .get(&url)
            .query(&[("max-results", FILES_PAGE_SIZE.to_string())]);
        let payload: DiffCommentList = self.fetch_json(request).await?;
        Ok(payload.diff_comments.into_iter().map(Into::into).collect())
    }

    async fn create_diff_comment(
        &self,
        review_request_id: u64,
        review_id: u64,
        comment: &NewDiffComment,
    ) -> Result<DiffComment> {
        let url = self.resource_url(Resource::DiffComments {
            review_request_id,
            review_id,
        })?;
        debug!(
            "Posting comment on filediff {} lines {}+{}",
            comment.filediff_id, comment.first_line, comment.num_lines
        );
        let payload: DiffCommentItem = self
            .fetch_json(self.http.post(&url).form(&comment.form_fields()))
            .await?;
        Ok(payload.diff_comment.into())
    }
}

fn api_root(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url).map_err(|e| {
        ClientError::Connection(format!("invalid server URL '{}': {}", base_url, e))
    })?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("api/")
        .map_err(|e| ClientError::Connection(format!("invalid server URL '{}': {}", base_url, e)))
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Extract `err.msg` from a Review Board failure payload
fn server_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/err/msg")
        .and_then(Value::as_str)
        .map(str::to_string)
}

// === Wire payloads ===

#[derive(Debug, Default, Deserialize)]
struct Link {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReviewRequestLinks {
    #[serde(default)]
    submitter: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct RawReviewRequest {
    id: u64,
    #[serde(default)]
    changenum: Option<u64>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    links: ReviewRequestLinks,
}

impl From<RawReviewRequest> for ReviewRequest {
    fn from(raw: RawReviewRequest) -> Self {
        ReviewRequest {
            id: raw.id,
            changenum: raw.changenum,
            summary: raw.summary.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            status: raw.status.unwrap_or_default(),
            submitter: raw
                .links
                .submitter
                .and_then(|link| link.title)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReviewRequestList {
    #[serde(default)]
    review_requests: Vec<RawReviewRequest>,
}

#[derive(Debug, Deserialize)]
struct ReviewRequestItem {
    review_request: RawReviewRequest,
}

#[derive(Debug, Deserialize)]
struct DiffList {
    #[serde(default)]
    diffs: Vec<Diff>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    id: u64,
    #[serde(default)]
    source_file: String,
    #[serde(default)]
    dest_file: String,
    #[serde(default)]
    source_revision: String,
}

impl From<RawFile> for FileDiffSummary {
    fn from(raw: RawFile) -> Self {
        FileDiffSummary {
            id: raw.id,
            source_file: raw.source_file,
            dest_file: raw.dest_file,
            source_revision: raw.source_revision,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<RawFile>,
    #[serde(default)]
    total_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct FileItem {
    file: Value,
}

#[derive(Debug, Deserialize)]
struct DiffDataItem {
    diff_data: Value,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    id: u64,
    #[serde(default)]
    body_top: Option<String>,
    #[serde(default)]
    body_bottom: Option<String>,
    #[serde(default)]
    public: bool,
}

impl From<RawReview> for ReviewDraft {
    fn from(raw: RawReview) -> Self {
        ReviewDraft {
            id: raw.id,
            body_top: raw.body_top.unwrap_or_default(),
            body_bottom: raw.body_bottom.unwrap_or_default(),
            public: raw.public,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReviewItem {
    review: RawReview,
}

#[derive(Debug, Default, Deserialize)]
struct DiffCommentLinks {
    #[serde(default)]
    filediff: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct RawDiffComment {
    id: u64,
    first_line: usize,
    num_lines: usize,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    links: DiffCommentLinks,
}

impl From<RawDiffComment> for DiffComment {
    fn from(raw: RawDiffComment) -> Self {
        DiffComment {
            id: raw.id,
            first_line: raw.first_line,
            num_lines: raw.num_lines,
            text: raw.text.unwrap_or_default(),
            filediff_title: raw.links.filediff.and_then(|link| link.title),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DiffCommentList {
    #[serde(default)]
    diff_comments: Vec<RawDiffComment>,
}

#[derive(Debug, Deserialize)]
struct DiffCommentItem {
    diff_comment: RawDiffComment,
}
