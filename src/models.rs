use serde::{Deserialize, Serialize};

// --- Job status ---

/// Server-side job phase as reported by `GET /api/status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
  #[default]
  Idle,
  Starting,
  Downloading,
  Converting,
  Error,
}

/// Flat snapshot of the single global job. The server fills absent values with
/// `0`, `""` or `null`, so the accessors below normalise those to `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobStatus {
  #[serde(default)]
  pub active: bool,
  #[serde(default)]
  pub status: JobState,
  #[serde(default)]
  pub progress: f64,
  #[serde(default)]
  pub current_item: Option<String>,
  #[serde(default)]
  pub current_item_num: Option<u32>,
  #[serde(default)]
  pub total_items: Option<u32>,
  /// Bytes per second.
  #[serde(default)]
  pub speed: Option<f64>,
  /// Seconds remaining.
  #[serde(default)]
  pub eta: Option<f64>,
  #[serde(default)]
  pub error: Option<String>,
}

impl JobStatus {
  pub fn current_item(&self) -> Option<&str> {
    self.current_item.as_deref().filter(|s| !s.is_empty())
  }

  pub fn speed(&self) -> Option<f64> {
    self.speed.filter(|s| *s > 0.0)
  }

  pub fn eta(&self) -> Option<f64> {
    self.eta.filter(|s| *s > 0.0)
  }

  pub fn error_message(&self) -> Option<&str> {
    self.error.as_deref().filter(|s| !s.is_empty())
  }
}

// --- Media info ---

/// A single row of a playlist listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
  /// Submission identifier; zero or negative marks an unavailable entry.
  pub index: i64,
  /// Position in the original playlist, for display only.
  #[serde(default)]
  pub original_index: u32,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub duration: Option<f64>,
  #[serde(default = "default_available")]
  pub available: bool,
}

fn default_available() -> bool {
  true
}

impl VideoEntry {
  /// Only available entries with a positive index may be submitted.
  pub fn is_selectable(&self) -> bool {
    self.available && self.index > 0
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistInfo {
  pub title: String,
  /// Number of available videos.
  #[serde(default)]
  pub count: u32,
  #[serde(default)]
  pub unavailable_count: u32,
  #[serde(default)]
  pub videos: Vec<VideoEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
  pub title: String,
  #[serde(default)]
  pub duration: Option<f64>,
  #[serde(default)]
  pub uploader: Option<String>,
  #[serde(default)]
  pub view_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaInfo {
  Video(VideoInfo),
  Playlist(PlaylistInfo),
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfoResponse {
  pub info: MediaInfo,
  #[serde(default)]
  pub default_downloads_path: Option<String>,
}

// --- Requests ---

#[derive(Debug, Clone, Serialize)]
pub struct InfoRequest<'a> {
  pub url: &'a str,
}

/// Body of `POST /api/download`. `selected_indices` serialises as `null`
/// for single videos, meaning "no restriction".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadRequest {
  pub url: String,
  pub bitrate: String,
  pub output_dir: String,
  pub selected_indices: Option<Vec<i64>>,
}

// --- Downloaded files ---

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadedFile {
  pub name: String,
  /// Path relative to the listing directory.
  pub path: String,
  #[serde(default)]
  pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DownloadListing {
  #[serde(default)]
  pub path: Option<String>,
  #[serde(default)]
  pub files: Vec<DownloadedFile>,
}

/// Error payload returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
  #[serde(default)]
  pub error: Option<String>,
  #[serde(default)]
  pub ffmpeg_error: bool,
}
