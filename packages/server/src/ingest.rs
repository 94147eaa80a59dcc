use std::time::Duration;

use common::storage::BoxReader;
use futures::TryStreamExt;
use percent_encoding::percent_decode_str;
use reqwest::Url;
use tokio_util::io::StreamReader;
use tracing::{debug, instrument};

use crate::error::{RepoError, Result};

/// Bytes supplied directly with the request.
pub struct InlineUpload {
    /// Filename as sent by the client; recorded as the file's origin.
    pub filename: String,
    pub reader: BoxReader,
}

impl std::fmt::Debug for InlineUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineUpload")
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

/// Where the bytes of a new file come from.
#[derive(Debug)]
pub enum IngestSource {
    Remote(Url),
    Inline(InlineUpload),
}

impl IngestSource {
    /// Build a source from the optional remote reference and optional inline
    /// upload of a request. Exactly one must be present; an empty reference
    /// counts as absent.
    pub fn from_parts(reference: Option<String>, upload: Option<InlineUpload>) -> Result<Self> {
        let reference = reference.filter(|r| !r.trim().is_empty());
        match (reference, upload) {
            (Some(_), Some(_)) => Err(RepoError::Validation(
                "provide either a remote reference or an uploaded file, not both".into(),
            )),
            (None, None) => Err(RepoError::Validation(
                "a remote reference or an uploaded file is required".into(),
            )),
            (Some(reference), None) => Ok(IngestSource::Remote(parse_remote(&reference)?)),
            (None, Some(upload)) => Ok(IngestSource::Inline(upload)),
        }
    }

    /// Origin recorded in the file's `path` column.
    pub fn origin(&self) -> String {
        match self {
            IngestSource::Remote(url) => url.to_string(),
            IngestSource::Inline(upload) => upload.filename.clone(),
        }
    }

    /// Display name used when the caller does not supply one.
    pub fn default_display_name(&self) -> Option<String> {
        let segment = match self {
            IngestSource::Remote(url) => url
                .path_segments()
                .and_then(|segments| segments.last())
                .unwrap_or_default(),
            IngestSource::Inline(upload) => last_segment(&upload.filename),
        };
        let decoded = percent_decode_str(segment).decode_utf8_lossy();
        let trimmed = decoded.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

fn last_segment(path: &str) -> &str {
    let path = path.trim_end_matches(['/', '\\']);
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn parse_remote(reference: &str) -> Result<Url> {
    let url = Url::parse(reference.trim())
        .map_err(|e| RepoError::Validation(format!("invalid remote reference: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RepoError::Validation(format!(
            "remote reference must use http or https, got {other}"
        ))),
    }
}

/// Resolves remote references into byte streams.
#[derive(Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
}

impl RemoteFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RepoError::UpstreamFetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Start a GET for `url` and hand back its body as a reader. The body is
    /// streamed, so the timeout also bounds reading it.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<BoxReader> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RepoError::UpstreamFetch(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepoError::UpstreamFetch(format!(
                "{url} responded with status {status}"
            )));
        }
        debug!(status = %status, content_length = ?response.content_length(), "Remote fetch started");

        let body = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(body))))
    }
}
