//! Job status monitor.
//!
//! The server exposes a flat status snapshot for its single global job, never an
//! event stream. The monitor polls that snapshot and infers the edges itself:
//! a job starting, failing, or finishing. A `completion_handled` latch makes each
//! terminal outcome fire once, however many identical snapshots follow it.
//!
//! Completion has no explicit signal. The server resets to `idle` with
//! `progress == 0` when a job finishes, which is indistinguishable from the
//! state before any job ran, so it only counts as completion while the
//! progress panel is visible.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::format::{format_eta, format_speed};
use crate::models::{JobState, JobStatus};

type Fetched = Result<JobStatus, ClientError>;

/// Anything that can report the current job status.
pub trait StatusSource: Clone + Send + Sync + 'static {
  fn fetch_status(&self) -> impl Future<Output = Fetched> + Send;
}

impl StatusSource for ApiClient {
  fn fetch_status(&self) -> impl Future<Output = Fetched> + Send {
    self.job_status()
  }
}

/// What one status snapshot means to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
  /// Nothing to report: steady idle, an already-handled terminal state, or a
  /// failed poll.
  Idle,
  Running(ProgressSnapshot),
  Succeeded,
  Failed(String),
}

/// Display-ready rendering of an active job.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
  pub label: String,
  pub percent: u16,
  pub speed: String,
  pub eta: String,
}

impl ProgressSnapshot {
  pub fn from_status(status: &JobStatus) -> Self {
    let label = match status.status {
      JobState::Downloading => {
        let mut text = status.current_item().unwrap_or("Downloading...").to_string();
        if let Some(total) = status.total_items.filter(|t| *t > 1) {
          text.push_str(&format!(" ({}/{})", status.current_item_num.unwrap_or(0), total));
        }
        text
      }
      JobState::Converting => "Converting to MP3...".to_string(),
      JobState::Starting => "Starting download...".to_string(),
      JobState::Idle | JobState::Error => "Preparing...".to_string(),
    };
    Self {
      label,
      percent: status.progress.round().clamp(0.0, 100.0) as u16,
      speed: format_speed(status.speed()),
      eta: format_eta(status.eta()),
    }
  }

  /// Placeholder shown between submitting a download and the first poll.
  pub fn pending() -> Self {
    Self { label: "Starting download...".to_string(), percent: 0, speed: format_speed(None), eta: format_eta(None) }
  }
}

/// A running poll task. Each armed task owns its result channel; dropping the
/// receiver on stop discards anything a cancelled fetch still delivers.
struct Poller {
  handle: JoinHandle<()>,
  rx: mpsc::Receiver<Fetched>,
}

pub struct JobMonitor<S: StatusSource> {
  source: S,
  interval: Duration,
  poller: Option<Poller>,
  completion_handled: bool,
  panel_visible: bool,
  snapshot: Option<ProgressSnapshot>,
}

impl<S: StatusSource> JobMonitor<S> {
  pub fn new(source: S, interval: Duration) -> Self {
    Self { source, interval, poller: None, completion_handled: false, panel_visible: false, snapshot: None }
  }

  pub fn is_polling(&self) -> bool {
    self.poller.is_some()
  }

  pub fn panel_visible(&self) -> bool {
    self.panel_visible
  }

  /// Last rendered progress, for display only.
  pub fn snapshot(&self) -> Option<&ProgressSnapshot> {
    self.snapshot.as_ref()
  }

  /// Begin polling at the configured interval; the first fetch happens one
  /// interval from now. No-op while already polling.
  pub fn start(&mut self) {
    if self.is_polling() {
      return;
    }
    let (tx, rx) = mpsc::channel(8);
    let source = self.source.clone();
    let period = self.interval;
    let first = Instant::now() + period;
    let handle = tokio::spawn(async move {
      let mut ticker = tokio::time::interval_at(first, period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        ticker.tick().await;
        let fetched = source.fetch_status().await;
        if tx.send(fetched).await.is_err() {
          break;
        }
      }
    });
    debug!(interval_ms = period.as_millis() as u64, "monitor: polling started");
    self.poller = Some(Poller { handle, rx });
  }

  /// Cancel polling. Safe to call when already stopped.
  pub fn stop(&mut self) {
    if let Some(poller) = self.poller.take() {
      poller.handle.abort();
      debug!("monitor: polling stopped");
    }
  }

  /// Prepare for a freshly submitted download: forget the previous outcome,
  /// show the progress panel, and restart polling. Restarting drops any fetch
  /// already in flight; the next one comes a full interval after submission.
  pub fn arm_for_download(&mut self) {
    self.completion_handled = false;
    self.panel_visible = true;
    self.snapshot = Some(ProgressSnapshot::pending());
    self.stop();
    self.start();
  }

  /// The download request itself was rejected; hide the panel again.
  pub fn abandon_download(&mut self) {
    self.panel_visible = false;
    self.snapshot = None;
  }

  /// Fetch one status snapshot and classify it, outside the poll task.
  pub async fn tick(&mut self) -> JobOutcome {
    let fetched = self.source.fetch_status().await;
    self.apply(fetched)
  }

  /// Classify every result the poll task has delivered since the last call.
  /// Only reportable outcomes are returned.
  pub fn drain(&mut self) -> Vec<JobOutcome> {
    let mut outcomes = Vec::new();
    while let Some(poller) = self.poller.as_mut() {
      let Ok(fetched) = poller.rx.try_recv() else { break };
      let outcome = self.apply(fetched);
      if outcome != JobOutcome::Idle {
        outcomes.push(outcome);
      }
    }
    outcomes
  }

  /// Classify a fetch result. Transport failures are logged and leave
  /// polling running.
  pub fn apply(&mut self, fetched: Fetched) -> JobOutcome {
    match fetched {
      Ok(status) => self.classify(&status),
      Err(e) => {
        warn!(err = %e, "monitor: status check failed");
        JobOutcome::Idle
      }
    }
  }

  fn classify(&mut self, status: &JobStatus) -> JobOutcome {
    if status.active {
      self.completion_handled = false;
      self.panel_visible = true;
      let snapshot = ProgressSnapshot::from_status(status);
      self.snapshot = Some(snapshot.clone());
      if status.status == JobState::Error {
        return self.fail(status);
      }
      return JobOutcome::Running(snapshot);
    }

    if !self.completion_handled && status.status == JobState::Idle && status.progress == 0.0 {
      if !self.panel_visible {
        return JobOutcome::Idle;
      }
      info!("monitor: job completed");
      self.settle();
      return JobOutcome::Succeeded;
    }

    if status.status == JobState::Error && !self.completion_handled {
      return self.fail(status);
    }

    JobOutcome::Idle
  }

  fn fail(&mut self, status: &JobStatus) -> JobOutcome {
    let message = status.error_message().unwrap_or("Download failed").to_string();
    warn!(err = %message, "monitor: job failed");
    self.settle();
    JobOutcome::Failed(message)
  }

  /// Terminal state reached: hide progress, latch, and stop polling.
  fn settle(&mut self) {
    self.panel_visible = false;
    self.snapshot = None;
    self.completion_handled = true;
    self.stop();
  }
}
