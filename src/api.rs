use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::constants::constants;
use crate::error::ClientError;
use crate::models::{DownloadListing, DownloadRequest, ErrorBody, InfoRequest, InfoResponse, JobStatus};

/// Thin HTTP client for the download service's JSON API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
  http: Client,
  base: Url,
}

impl ApiClient {
  pub fn new(base_url: &str) -> Result<Self, ClientError> {
    let base = parse_base_url(base_url)?;
    let http = Client::builder().timeout(constants().request_timeout()).build()?;
    Ok(Self { http, base })
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
    self.base.join(path).map_err(|e| ClientError::InvalidUrl { url: self.base.to_string(), reason: e.to_string() })
  }

  /// `POST /api/info`: metadata for a video or playlist URL.
  pub async fn fetch_info(&self, url: &str) -> Result<InfoResponse, ClientError> {
    debug!(url = %url, "api: fetching info");
    let resp = self.http.post(self.endpoint("api/info")?).json(&InfoRequest { url }).send().await?;
    read_json(resp, "Failed to get video info").await
  }

  /// `POST /api/download`: start the server-side download/convert job.
  pub async fn start_download(&self, request: &DownloadRequest) -> Result<(), ClientError> {
    debug!(
      url = %request.url,
      bitrate = %request.bitrate,
      items = request.selected_indices.as_ref().map_or(0, Vec::len),
      "api: starting download"
    );
    let resp = self.http.post(self.endpoint("api/download")?).json(request).send().await?;
    if resp.status().is_success() {
      return Ok(());
    }
    Err(error_from_response(resp, "Failed to start download").await)
  }

  /// `GET /api/status`: current job snapshot.
  pub async fn job_status(&self) -> Result<JobStatus, ClientError> {
    let resp = self.http.get(self.endpoint("api/status")?).send().await?;
    read_json(resp, "Failed to get status").await
  }

  /// `GET /api/downloads?dir=…`: files produced in `dir`.
  pub async fn list_downloads(&self, dir: &str) -> Result<DownloadListing, ClientError> {
    let resp = self.http.get(self.endpoint("api/downloads")?).query(&[("dir", dir)]).send().await?;
    read_json(resp, "Failed to load files").await
  }

  /// URL of `GET /api/download-file`. Retrieval is a navigation handled by the
  /// platform opener, not a JSON request.
  pub fn file_url(&self, path: &str, dir: &str) -> Result<Url, ClientError> {
    let mut url = self.endpoint("api/download-file")?;
    url.query_pairs_mut().append_pair("path", path).append_pair("dir", dir);
    Ok(url)
  }
}

/// Parse the server base URL, forcing a trailing slash so relative endpoint
/// joins keep any path prefix.
fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
  let trimmed = raw.trim();
  let with_slash = if trimmed.ends_with('/') { trimmed.to_string() } else { format!("{}/", trimmed) };
  let url = Url::parse(&with_slash)
    .map_err(|e| ClientError::InvalidUrl { url: trimmed.to_string(), reason: e.to_string() })?;
  if !matches!(url.scheme(), "http" | "https") {
    return Err(ClientError::InvalidUrl { url: trimmed.to_string(), reason: "expected http or https".to_string() });
  }
  Ok(url)
}

async fn read_json<T: DeserializeOwned>(resp: Response, fallback: &str) -> Result<T, ClientError> {
  if resp.status().is_success() {
    return Ok(resp.json::<T>().await?);
  }
  Err(error_from_response(resp, fallback).await)
}

async fn error_from_response(resp: Response, fallback: &str) -> ClientError {
  let status = resp.status();
  let body = resp.json::<ErrorBody>().await.unwrap_or_default();
  let message = body.error.filter(|m| !m.is_empty()).unwrap_or_else(|| fallback.to_string());
  warn!(status = %status, err = %message, "api: request rejected");
  if body.ffmpeg_error { ClientError::Ffmpeg(message) } else { ClientError::Request(message) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn base_url_gains_trailing_slash() {
    let client = ApiClient::new("http://localhost:5000").unwrap();
    assert_eq!(client.base_url().as_str(), "http://localhost:5000/");
  }

  #[test]
  fn endpoints_keep_path_prefix() {
    let client = ApiClient::new("http://example.test/ytmp3").unwrap();
    assert_eq!(client.endpoint("api/status").unwrap().as_str(), "http://example.test/ytmp3/api/status");
  }

  #[test]
  fn rejects_non_http_base() {
    assert!(matches!(ApiClient::new("ftp://example.test"), Err(ClientError::InvalidUrl { .. })));
    assert!(matches!(ApiClient::new("not a url"), Err(ClientError::InvalidUrl { .. })));
  }

  #[test]
  fn file_url_encodes_query() {
    let client = ApiClient::new("http://localhost:5000/").unwrap();
    let url = client.file_url("Mix/01 - A & B.mp3", "downloads").unwrap();
    assert_eq!(url.path(), "/api/download-file");
    let pairs: Vec<(String, String)> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
    assert_eq!(
      pairs,
      vec![("path".to_string(), "Mix/01 - A & B.mp3".to_string()), ("dir".to_string(), "downloads".to_string())]
    );
  }
}
