use std::collections::BTreeSet;

use crate::error::ClientError;
use crate::models::{PlaylistInfo, VideoEntry};

/// One rendered playlist row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaylistRow<'a> {
  pub entry: &'a VideoEntry,
  pub checked: bool,
  pub disabled: bool,
}

/// Which playlist entries the user wants downloaded.
///
/// Scoped to a single info result: `initialize` replaces everything, `clear`
/// drops it when the result was a single video.
#[derive(Debug, Default)]
pub struct PlaylistSelection {
  playlist: Option<PlaylistInfo>,
  selected: BTreeSet<i64>,
  cursor: usize,
}

impl PlaylistSelection {
  /// Adopt a new playlist with every selectable entry selected.
  pub fn initialize(&mut self, info: PlaylistInfo) {
    self.selected = info.videos.iter().filter(|v| v.is_selectable()).map(|v| v.index).collect();
    self.cursor = 0;
    self.playlist = Some(info);
  }

  pub fn clear(&mut self) {
    self.playlist = None;
    self.selected.clear();
    self.cursor = 0;
  }

  pub fn playlist(&self) -> Option<&PlaylistInfo> {
    self.playlist.as_ref()
  }

  pub fn is_playlist(&self) -> bool {
    self.playlist.is_some()
  }

  pub fn is_selected(&self, index: i64) -> bool {
    self.selected.contains(&index)
  }

  /// Every entry in playlist order, unavailable ones included.
  pub fn rows(&self) -> impl Iterator<Item = PlaylistRow<'_>> {
    self.playlist.iter().flat_map(|p| p.videos.iter()).map(|entry| PlaylistRow {
      entry,
      checked: entry.is_selectable() && self.is_selected(entry.index),
      disabled: !entry.is_selectable(),
    })
  }

  pub fn row_count(&self) -> usize {
    self.playlist.as_ref().map_or(0, |p| p.videos.len())
  }

  /// Set one entry's membership. Sentinel indices never touch the set.
  pub fn toggle(&mut self, index: i64, checked: bool) {
    if index <= 0 {
      return;
    }
    if checked {
      self.selected.insert(index);
    } else {
      self.selected.remove(&index);
    }
  }

  pub fn select_all(&mut self) {
    if let Some(ref playlist) = self.playlist {
      self.selected.extend(playlist.videos.iter().filter(|v| v.is_selectable()).map(|v| v.index));
    }
  }

  pub fn deselect_all(&mut self) {
    self.selected.clear();
  }

  /// Selected entries of the current playlist; indices naming no selectable
  /// entry are not counted.
  pub fn count(&self) -> usize {
    self.rows().filter(|r| r.checked).count()
  }

  /// Indices to submit with a download, ascending.
  ///
  /// `None` means "no restriction" (the current result is not a playlist).
  /// Indices that no longer name a selectable entry are dropped; a playlist
  /// with nothing left to download is a validation error.
  pub fn build_submission(&self) -> Result<Option<Vec<i64>>, ClientError> {
    let Some(ref playlist) = self.playlist else {
      return Ok(None);
    };
    let indices: Vec<i64> = self
      .selected
      .iter()
      .copied()
      .filter(|idx| playlist.videos.iter().any(|v| v.index == *idx && v.is_selectable()))
      .collect();
    if indices.is_empty() {
      return Err(ClientError::Validation("Please select at least one available video from the playlist".to_string()));
    }
    Ok(Some(indices))
  }

  // --- Row cursor ---

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  pub fn cursor_next(&mut self) {
    let len = self.row_count();
    if len > 0 {
      self.cursor = (self.cursor + 1) % len;
    }
  }

  pub fn cursor_prev(&mut self) {
    let len = self.row_count();
    if len > 0 {
      self.cursor = if self.cursor == 0 { len - 1 } else { self.cursor - 1 };
    }
  }

  /// Flip the row under the cursor; disabled rows ignore the request.
  pub fn toggle_at_cursor(&mut self) {
    let Some(entry) = self.playlist.as_ref().and_then(|p| p.videos.get(self.cursor)) else { return };
    if !entry.is_selectable() {
      return;
    }
    let index = entry.index;
    let checked = !self.selected.contains(&index);
    self.toggle(index, checked);
  }
}
