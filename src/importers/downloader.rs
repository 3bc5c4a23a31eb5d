use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("File not found (404): {0}")]
    NotFound(String),

    #[error("Server error (5xx): {0}")]
    ServerError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to read local file: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolves a remote identifier to the bytes of the workbook it names.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, DownloadError>;
}

/// Downloads workbooks over HTTP(S), accepting Google Drive share links.
#[derive(Clone)]
pub struct HttpFileFetcher {
    client: Client,
}

impl HttpFileFetcher {
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, DownloadError> {
        let url = resolve_download_url(source)?;
        info!("Downloading workbook: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            debug!("Downloaded {url} ({} bytes)", bytes.len());
            Ok(bytes.to_vec())
        } else if status.as_u16() == 404 {
            Err(DownloadError::NotFound(format!("{url} not found on server")))
        } else if status.is_server_error() {
            Err(DownloadError::ServerError(format!(
                "Server error {status} while downloading {url}"
            )))
        } else {
            match response.error_for_status() {
                Err(e) => Err(DownloadError::HttpError(e)),
                Ok(_) => Err(DownloadError::ServerError(format!(
                    "Unexpected status {status} while downloading {url}"
                ))),
            }
        }
    }
}

/// Reads workbooks from the local filesystem; `source` is a path.
#[derive(Clone, Default)]
pub struct LocalFileFetcher {
    root: Option<PathBuf>,
}

impl LocalFileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative sources against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

#[async_trait]
impl FileFetcher for LocalFileFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, DownloadError> {
        let path = match &self.root {
            Some(root) => root.join(source),
            None => PathBuf::from(source),
        };
        let bytes = tokio::fs::read(&path).await?;
        debug!("Read {} ({} bytes)", path.display(), bytes.len());
        Ok(bytes)
    }
}

/// Turn a share link into a direct download URL.
///
/// Google Drive links (`/file/d/<id>/view`, `open?id=<id>`, `uc?id=<id>`) are
/// rewritten to the `uc?export=download` form; other http(s) URLs pass through.
pub fn resolve_download_url(source: &str) -> Result<String, DownloadError> {
    let url = Url::parse(source.trim())
        .map_err(|e| DownloadError::InvalidUrl(format!("{source}: {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(DownloadError::InvalidUrl(format!(
            "{source}: unsupported scheme {}",
            url.scheme()
        )));
    }

    if url.host_str() != Some("drive.google.com") {
        return Ok(url.to_string());
    }

    let from_path = url
        .path_segments()
        .and_then(|mut segments| {
            while let Some(segment) = segments.next() {
                if segment == "d" {
                    return segments.next().map(str::to_string);
                }
            }
            None
        })
        .filter(|id| !id.is_empty());

    let file_id = from_path.or_else(|| {
        url.query_pairs()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.into_owned())
    });

    match file_id {
        Some(id) => Ok(format!(
            "https://drive.google.com/uc?export=download&id={id}"
        )),
        None => Err(DownloadError::InvalidUrl(format!(
            "{source}: no file id in Google Drive link"
        ))),
    }
}
