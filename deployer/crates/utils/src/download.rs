use bytes::Bytes;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Transport level failure (DNS, connection refused, timeout, ...)
    #[error("Request to {url} failed: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with anything else than `200 OK`
    #[error("Unexpected http status code {status} while downloading {url}")]
    UnexpectedStatus { url: Url, status: StatusCode },

    /// The connection broke while the body was being read
    #[error("Failed to read response body from {url}: {source}")]
    Body {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
}

impl DownloadError {
    /// Returns the HTTP status if the server answered with a non 200 response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DownloadError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Downloads an archive and returns its full body.
///
/// Only a `200 OK` response is accepted, and the body is always read to the end before it is
/// returned, so callers never observe a partially downloaded archive.
pub async fn fetch_archive(client: &reqwest::Client, url: &Url) -> Result<Bytes, DownloadError> {
    debug!(%url, "starting download");

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| DownloadError::Request { url: url.clone(), source })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(DownloadError::UnexpectedStatus { url: url.clone(), status });
    }

    let body = response.bytes().await.map_err(|source| DownloadError::Body { url: url.clone(), source })?;
    debug!(%url, size = body.len(), "download successful");

    Ok(body)
}
