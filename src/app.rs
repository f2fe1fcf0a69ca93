use ratatui::widgets::ListState;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::constants::constants;
use crate::error::ClientError;
use crate::input::TextField;
use crate::models::{DownloadListing, DownloadRequest, DownloadedFile, InfoResponse, MediaInfo, VideoInfo};
use crate::monitor::{JobMonitor, JobOutcome};
use crate::selection::PlaylistSelection;
use crate::theme::{THEMES, Theme, theme_index};

// --- Types ---

/// Which panel receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Url,
  OutputDir,
  Playlist,
  Files,
}

/// Transient notice shown above the footer; auto-dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
  Error(String),
  Success(String),
}

/// Contents of the downloaded-files panel. Load errors are shown inline here
/// rather than as a banner.
#[derive(Debug, Clone, PartialEq)]
pub enum FilesView {
  Loading,
  Loaded(Vec<DownloadedFile>),
  Failed(String),
}

/// Startup choices resolved from CLI flags, saved preferences and constants.
pub struct Settings {
  pub api: ApiClient,
  pub bitrate: String,
  pub output_dir: String,
  pub theme_name: Option<String>,
}

/// In-flight request receivers. Replacing a receiver drops the previous
/// request's answer.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) info_rx: Option<oneshot::Receiver<Result<InfoResponse, ClientError>>>,
  pub(crate) download_rx: Option<oneshot::Receiver<Result<(), ClientError>>>,
  pub(crate) files_rx: Option<oneshot::Receiver<Result<DownloadListing, ClientError>>>,
}

/// Poll a pending oneshot without blocking. `Some(None)` means the task
/// ended without answering.
fn poll_task<T>(slot: &mut Option<oneshot::Receiver<T>>) -> Option<Option<T>> {
  let mut rx = slot.take()?;
  match rx.try_recv() {
    Ok(value) => Some(Some(value)),
    Err(oneshot::error::TryRecvError::Empty) => {
      *slot = Some(rx);
      None
    }
    Err(oneshot::error::TryRecvError::Closed) => Some(None),
  }
}

pub struct App {
  pub url: TextField,
  pub output_dir: TextField,
  /// Server-suggested downloads path, shown while the output field is a placeholder.
  pub output_hint: Option<String>,
  pub bitrates: Vec<String>,
  pub bitrate_index: usize,
  pub focus: Focus,
  pub theme_index: usize,
  pub api: ApiClient,
  pub monitor: JobMonitor<ApiClient>,
  pub selection: PlaylistSelection,
  /// Info for a single-video result; playlists live in `selection`.
  pub video: Option<VideoInfo>,
  pub files: FilesView,
  pub files_state: ListState,
  pub banner: Option<Banner>,
  banner_time: Option<Instant>,
  /// "Get Info" is disabled while a request is in flight.
  pub info_busy: bool,
  /// "Download & Convert" stays disabled from submission until a terminal outcome.
  pub download_busy: bool,
  pub should_quit: bool,
  pub(crate) tasks: AsyncTasks,
}

impl App {
  pub fn new(settings: Settings) -> Self {
    let mut bitrates = constants().bitrates.clone();
    let bitrate_index = match bitrates.iter().position(|b| *b == settings.bitrate) {
      Some(i) => i,
      None => {
        bitrates.push(settings.bitrate);
        bitrates.len() - 1
      }
    };
    let theme_index = settings.theme_name.as_deref().and_then(theme_index).unwrap_or(0);
    let monitor = JobMonitor::new(settings.api.clone(), constants().poll_interval());

    Self {
      url: TextField::default(),
      output_dir: TextField::new(settings.output_dir),
      output_hint: None,
      bitrates,
      bitrate_index,
      focus: Focus::Url,
      theme_index,
      api: settings.api,
      monitor,
      selection: PlaylistSelection::default(),
      video: None,
      files: FilesView::Loading,
      files_state: ListState::default(),
      banner: None,
      banner_time: None,
      info_busy: false,
      download_busy: false,
      should_quit: false,
      tasks: AsyncTasks::default(),
    }
  }

  /// Load the file list, check once for a job already running on the
  /// server, then start polling. A stale job error is shown once and leaves
  /// polling off until the next download.
  pub async fn startup(&mut self) {
    self.trigger_refresh_files();
    let outcome = match tokio::time::timeout(constants().poll_interval(), self.monitor.tick()).await {
      Ok(outcome) => outcome,
      Err(_) => {
        debug!("startup status check timed out");
        JobOutcome::Idle
      }
    };
    let failed = matches!(outcome, JobOutcome::Failed(_));
    self.handle_outcome(outcome);
    if !failed {
      self.monitor.start();
    }
  }

  pub fn theme(&self) -> &'static Theme {
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.save_config();
  }

  pub fn bitrate(&self) -> &str {
    &self.bitrates[self.bitrate_index]
  }

  pub fn next_bitrate(&mut self) {
    self.bitrate_index = (self.bitrate_index + 1) % self.bitrates.len();
  }

  /// The directory sent to the server; blank means the server's default.
  pub fn output_dir_value(&self) -> String {
    let value = self.output_dir.value().trim();
    if value.is_empty() { constants().placeholder_output_dir.clone() } else { value.to_string() }
  }

  fn output_dir_is_placeholder(&self) -> bool {
    self.output_dir_value() == constants().placeholder_output_dir
  }

  /// Persist the current choices to `prefs.toml`; failures are only logged.
  pub fn save_config(&self) {
    let config = Config {
      theme_name: Some(self.theme().name.to_string()),
      server_url: Some(self.api.base_url().to_string()),
      bitrate: Some(self.bitrate().to_string()),
      output_dir: Some(self.output_dir_value()),
    };
    if let Err(e) = config.save() {
      warn!(err = %e, "config: failed to save preferences");
    }
  }

  // --- Focus ---

  fn focus_order(&self) -> Vec<Focus> {
    let mut order = vec![Focus::Url, Focus::OutputDir];
    if self.selection.is_playlist() {
      order.push(Focus::Playlist);
    }
    order.push(Focus::Files);
    order
  }

  pub fn focus_next(&mut self) {
    let order = self.focus_order();
    let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
    self.focus = order[(idx + 1) % order.len()];
  }

  pub fn focus_prev(&mut self) {
    let order = self.focus_order();
    let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
    self.focus = order[(idx + order.len() - 1) % order.len()];
  }

  // --- Banners ---

  pub fn set_error(&mut self, msg: impl Into<String>) {
    self.banner = Some(Banner::Error(msg.into()));
    self.banner_time = Some(Instant::now());
  }

  pub fn set_success(&mut self, msg: impl Into<String>) {
    self.banner = Some(Banner::Success(msg.into()));
    self.banner_time = Some(Instant::now());
  }

  pub fn clear_banner(&mut self) {
    self.banner = None;
    self.banner_time = None;
  }

  /// Dismiss the banner once it has been visible for `timeout`.
  pub fn expire_banner(&mut self, timeout: Duration) {
    if let Some(t) = self.banner_time
      && t.elapsed() >= timeout
    {
      self.clear_banner();
    }
  }

  // --- Actions ---

  pub fn trigger_info(&mut self) {
    if self.info_busy {
      return;
    }
    let url = self.url.value().trim().to_string();
    if url.is_empty() {
      self.set_error("Please enter a YouTube URL");
      return;
    }
    info!(url = %url, "info requested");
    self.info_busy = true;

    let api = self.api.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(api.fetch_info(&url).await);
    });
    self.tasks.info_rx = Some(rx);
  }

  pub fn trigger_download(&mut self) {
    if self.download_busy {
      return;
    }
    let url = self.url.value().trim().to_string();
    if url.is_empty() {
      self.set_error("Please enter a YouTube URL");
      return;
    }
    let selected_indices = match self.selection.build_submission() {
      Ok(indices) => indices,
      Err(e) => {
        self.set_error(e.to_string());
        return;
      }
    };

    let request =
      DownloadRequest { url, bitrate: self.bitrate().to_string(), output_dir: self.output_dir_value(), selected_indices };
    info!(
      url = %request.url,
      bitrate = %request.bitrate,
      output_dir = %request.output_dir,
      items = ?request.selected_indices,
      "download requested"
    );

    self.download_busy = true;
    self.clear_banner();
    self.monitor.arm_for_download();

    let api = self.api.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(api.start_download(&request).await);
    });
    self.tasks.download_rx = Some(rx);
  }

  pub fn trigger_refresh_files(&mut self) {
    let dir = self.output_dir_value();
    debug!(dir = %dir, "refreshing file list");
    self.files = FilesView::Loading;

    let api = self.api.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(api.list_downloads(&dir).await);
    });
    self.tasks.files_rx = Some(rx);
  }

  pub fn selected_file(&self) -> Option<&DownloadedFile> {
    let FilesView::Loaded(ref files) = self.files else { return None };
    files.get(self.files_state.selected()?)
  }

  pub fn select_file_next(&mut self) {
    if let FilesView::Loaded(ref files) = self.files
      && !files.is_empty()
    {
      let i = self.files_state.selected().map_or(0, |i| (i + 1) % files.len());
      self.files_state.select(Some(i));
    }
  }

  pub fn select_file_prev(&mut self) {
    if let FilesView::Loaded(ref files) = self.files
      && !files.is_empty()
    {
      let count = files.len();
      let i = self.files_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.files_state.select(Some(i));
    }
  }

  /// Hand the selected file's retrieval URL to the platform opener.
  pub fn retrieve_selected_file(&mut self) {
    let Some(file) = self.selected_file() else { return };
    let url = match self.api.file_url(&file.path, &self.output_dir_value()) {
      Ok(url) => url,
      Err(e) => {
        self.set_error(e.to_string());
        return;
      }
    };
    info!(url = %url, "opening downloaded file");
    if let Err(e) = open_url(url.as_str()) {
      self.set_error(format!("Failed to open browser: {}", e));
    }
  }

  // --- Pending work ---

  /// Apply finished requests and poll results. Called once per frame.
  pub fn check_pending(&mut self) {
    if let Some(result) = poll_task(&mut self.tasks.info_rx) {
      self.info_busy = false;
      match result {
        Some(Ok(resp)) => self.show_info(resp),
        Some(Err(e)) => self.set_error(e.to_string()),
        None => self.set_error("Info task failed."),
      }
    }

    if let Some(result) = poll_task(&mut self.tasks.download_rx) {
      match result {
        // Progress arrives through the monitor from here on.
        Some(Ok(())) => debug!("download accepted by server"),
        Some(Err(e)) => self.download_rejected(e.to_string()),
        None => self.download_rejected("Download task failed.".to_string()),
      }
    }

    if let Some(result) = poll_task(&mut self.tasks.files_rx) {
      match result {
        Some(Ok(listing)) => self.show_files(listing),
        Some(Err(e)) => self.files = FilesView::Failed(format!("Error loading files: {}", e)),
        None => self.files = FilesView::Failed("Error loading files: task failed".to_string()),
      }
    }

    for outcome in self.monitor.drain() {
      self.handle_outcome(outcome);
    }
  }

  pub fn handle_outcome(&mut self, outcome: JobOutcome) {
    match outcome {
      JobOutcome::Idle | JobOutcome::Running(_) => {}
      JobOutcome::Succeeded => {
        self.set_success("Download completed successfully!");
        self.download_busy = false;
        self.trigger_refresh_files();
      }
      JobOutcome::Failed(msg) => {
        self.set_error(msg);
        self.download_busy = false;
      }
    }
  }

  fn download_rejected(&mut self, msg: String) {
    self.set_error(msg);
    self.monitor.abandon_download();
    self.download_busy = false;
  }

  /// Replace the displayed info with a fresh result. Playlists reset the
  /// selection to every available entry; single videos clear it.
  pub fn show_info(&mut self, resp: InfoResponse) {
    if let Some(path) = resp.default_downloads_path {
      self.output_hint = Some(path);
    }
    match resp.info {
      MediaInfo::Playlist(playlist) => {
        info!(
          title = %playlist.title,
          available = playlist.count,
          unavailable = playlist.unavailable_count,
          "playlist info loaded"
        );
        self.video = None;
        self.selection.initialize(playlist);
      }
      MediaInfo::Video(video) => {
        info!(title = %video.title, "video info loaded");
        self.selection.clear();
        self.video = Some(video);
        if self.focus == Focus::Playlist {
          self.focus = Focus::Url;
        }
      }
    }
  }

  pub fn show_files(&mut self, listing: DownloadListing) {
    if let Some(path) = listing.path {
      if self.output_dir_is_placeholder() {
        self.output_dir.set(path.clone());
      }
      self.output_hint = Some(path);
    }
    let selected = if listing.files.is_empty() {
      None
    } else {
      Some(self.files_state.selected().unwrap_or(0).min(listing.files.len() - 1))
    };
    self.files_state.select(selected);
    self.files = FilesView::Loaded(listing.files);
  }
}

/// Open a URL with the platform's default handler.
fn open_url(url: &str) -> std::io::Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(target_os = "windows")]
  let cmd = "explorer";
  #[cfg(not(any(target_os = "macos", target_os = "windows")))]
  let cmd = "xdg-open";
  let mut child = std::process::Command::new(cmd)
    .arg(url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()?;
  // Reap the child in a background thread to avoid zombie processes.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{PlaylistInfo, VideoEntry};

  fn app() -> App {
    App::new(Settings {
      api: ApiClient::new("http://127.0.0.1:9").unwrap(),
      bitrate: "172k".to_string(),
      output_dir: "downloads".to_string(),
      theme_name: None,
    })
  }

  fn playlist_resp() -> InfoResponse {
    let entry = |index: i64, original_index: u32, available: bool| VideoEntry {
      index,
      original_index,
      title: format!("Track {}", original_index),
      duration: None,
      available,
    };
    InfoResponse {
      info: MediaInfo::Playlist(PlaylistInfo {
        title: "Mix".to_string(),
        count: 2,
        unavailable_count: 1,
        videos: vec![entry(1, 1, true), entry(-1, 2, false), entry(2, 3, true)],
      }),
      default_downloads_path: Some("/home/me/YouTube Downloads".to_string()),
    }
  }

  fn video_resp() -> InfoResponse {
    InfoResponse {
      info: MediaInfo::Video(VideoInfo { title: "Song".into(), duration: Some(200.0), uploader: None, view_count: None }),
      default_downloads_path: None,
    }
  }

  #[test]
  fn unknown_bitrate_is_appended() {
    let a = App::new(Settings {
      api: ApiClient::new("http://127.0.0.1:9").unwrap(),
      bitrate: "96k".to_string(),
      output_dir: String::new(),
      theme_name: Some("paper".to_string()),
    });
    assert_eq!(a.bitrate(), "96k");
    assert_eq!(a.theme().name, "Paper");
    assert_eq!(a.output_dir_value(), "downloads");
  }

  #[test]
  fn bitrate_cycles() {
    let mut a = app();
    let first = a.bitrate().to_string();
    for _ in 0..a.bitrates.len() {
      a.next_bitrate();
    }
    assert_eq!(a.bitrate(), first);
  }

  #[test]
  fn empty_url_fails_validation_without_request() {
    let mut a = app();
    a.trigger_download();
    assert_eq!(a.banner, Some(Banner::Error("Please enter a YouTube URL".into())));
    assert!(a.tasks.download_rx.is_none());
    assert!(!a.download_busy);
    a.trigger_info();
    assert!(a.tasks.info_rx.is_none());
    assert!(!a.info_busy);
  }

  #[test]
  fn empty_playlist_selection_fails_validation_without_request() {
    let mut a = app();
    a.url.set("https://www.youtube.com/playlist?list=PL1");
    a.show_info(playlist_resp());
    a.selection.deselect_all();
    a.trigger_download();
    assert_eq!(
      a.banner,
      Some(Banner::Error("Please select at least one available video from the playlist".into()))
    );
    assert!(a.tasks.download_rx.is_none());
    assert!(!a.monitor.is_polling());
    assert!(!a.monitor.panel_visible());
  }

  #[test]
  fn new_info_resets_selection() {
    let mut a = app();
    a.show_info(playlist_resp());
    assert_eq!(a.selection.count(), 2);
    assert_eq!(a.output_hint.as_deref(), Some("/home/me/YouTube Downloads"));
    a.selection.toggle(1, false);
    a.show_info(playlist_resp());
    assert_eq!(a.selection.count(), 2);

    a.focus = Focus::Playlist;
    a.show_info(video_resp());
    assert!(!a.selection.is_playlist());
    assert_eq!(a.focus, Focus::Url);
    assert!(a.video.is_some());
  }

  #[test]
  fn focus_cycle_includes_playlist_only_when_loaded() {
    let mut a = app();
    a.focus_next();
    a.focus_next();
    assert_eq!(a.focus, Focus::Files);
    a.show_info(playlist_resp());
    a.focus_prev();
    assert_eq!(a.focus, Focus::Playlist);
    a.focus_next();
    a.focus_next();
    assert_eq!(a.focus, Focus::Url);
  }

  #[test]
  fn listing_path_replaces_placeholder_output_dir() {
    let mut a = app();
    a.show_files(DownloadListing {
      path: Some("/home/me/YouTube Downloads".to_string()),
      files: vec![DownloadedFile { name: "a.mp3".into(), path: "a.mp3".into(), size: Some(10) }],
    });
    assert_eq!(a.output_dir.value(), "/home/me/YouTube Downloads");
    assert_eq!(a.files_state.selected(), Some(0));
    assert_eq!(a.selected_file().map(|f| f.name.as_str()), Some("a.mp3"));

    // A user-chosen directory is left alone
    a.output_dir.set("/music");
    a.show_files(DownloadListing { path: Some("/music".to_string()), files: vec![] });
    assert_eq!(a.output_dir.value(), "/music");
    assert_eq!(a.files_state.selected(), None);
  }

  #[test]
  fn outcomes_restore_controls() {
    let mut a = app();
    a.download_busy = true;
    a.handle_outcome(JobOutcome::Failed("X".into()));
    assert!(!a.download_busy);
    assert_eq!(a.banner, Some(Banner::Error("X".into())));
  }

  #[tokio::test]
  async fn success_outcome_refreshes_files() {
    let mut a = app();
    a.download_busy = true;
    a.handle_outcome(JobOutcome::Succeeded);
    assert!(!a.download_busy);
    assert_eq!(a.banner, Some(Banner::Success("Download completed successfully!".into())));
    assert_eq!(a.files, FilesView::Loading);
    assert!(a.tasks.files_rx.is_some());
  }

  #[tokio::test]
  async fn rejected_download_hides_progress() {
    let mut a = app();
    a.url.set("https://youtu.be/x");
    a.trigger_download();
    assert!(a.download_busy);
    assert!(a.monitor.panel_visible());
    a.download_rejected("Download already in progress".into());
    assert!(!a.download_busy);
    assert!(!a.monitor.panel_visible());
    a.monitor.stop();
  }

  #[tokio::test]
  async fn startup_keeps_polling_when_server_is_unreachable() {
    let mut a = app();
    a.startup().await;
    assert!(a.monitor.is_polling());
    assert!(!a.monitor.panel_visible());
    assert!(a.banner.is_none());
    assert!(a.tasks.files_rx.is_some());
    a.monitor.stop();
  }

  #[test]
  fn banner_expires() {
    let mut a = app();
    a.set_success("done");
    a.expire_banner(Duration::from_secs(5));
    assert!(a.banner.is_some());
    a.expire_banner(Duration::ZERO);
    assert!(a.banner.is_none());
  }
}
