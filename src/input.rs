use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, Focus};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Text fields ---

/// Single-line editable text with a char-indexed cursor and a horizontal
/// scroll offset maintained by the renderer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextField {
  value: String,
  cursor: usize,
  pub scroll: usize,
}

impl TextField {
  pub fn new(value: impl Into<String>) -> Self {
    let mut field = Self::default();
    field.set(value);
    field
  }

  pub fn value(&self) -> &str {
    &self.value
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  /// Replace the contents and move the cursor to the end.
  pub fn set(&mut self, value: impl Into<String>) {
    self.value = value.into();
    self.cursor = self.value.chars().count();
    self.scroll = 0;
  }

  pub fn clear(&mut self) {
    self.set(String::new());
  }

  /// Apply an editing key. Returns `false` for keys that are not edits.
  pub fn edit(&mut self, code: KeyCode) -> bool {
    match code {
      KeyCode::Char(c) => {
        let byte_idx = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_idx, c);
        self.cursor += 1;
      }
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let byte_idx = char_to_byte_index(&self.value, self.cursor);
          self.value.remove(byte_idx);
        }
      }
      KeyCode::Delete => {
        if self.cursor < self.value.chars().count() {
          let byte_idx = char_to_byte_index(&self.value, self.cursor);
          self.value.remove(byte_idx);
        }
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
      }
      KeyCode::Right => {
        if self.cursor < self.value.chars().count() {
          self.cursor += 1;
        }
      }
      KeyCode::Home => {
        self.cursor = 0;
      }
      KeyCode::End => {
        self.cursor = self.value.chars().count();
      }
      _ => return false,
    }
    true
  }
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => app.should_quit = true,
      KeyCode::Char('t') => app.next_theme(),
      KeyCode::Char('b') => app.next_bitrate(),
      KeyCode::Char('g') => app.trigger_info(),
      KeyCode::Char('d') => app.trigger_download(),
      KeyCode::Char('r') => app.trigger_refresh_files(),
      _ => {}
    }
    return;
  }

  match key.code {
    KeyCode::Tab => {
      app.focus_next();
      return;
    }
    KeyCode::BackTab => {
      app.focus_prev();
      return;
    }
    KeyCode::Esc if app.banner.is_some() => {
      app.clear_banner();
      return;
    }
    _ => {}
  }

  match app.focus {
    Focus::Url => handle_url_key(app, key),
    Focus::OutputDir => handle_output_dir_key(app, key),
    Focus::Playlist => handle_playlist_key(app, key),
    Focus::Files => handle_files_key(app, key),
  }
}

fn handle_url_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.trigger_download(),
    KeyCode::Esc => {
      if !app.url.value().is_empty() {
        app.url.clear();
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => app.focus_next(),
    code => {
      app.url.edit(code);
    }
  }
}

fn handle_output_dir_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.trigger_refresh_files(),
    KeyCode::Esc => app.focus = Focus::Url,
    KeyCode::Up => app.focus_prev(),
    KeyCode::Down => app.focus_next(),
    code => {
      app.output_dir.edit(code);
    }
  }
}

fn handle_playlist_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => app.selection.cursor_next(),
    KeyCode::Up | KeyCode::Char('k') => app.selection.cursor_prev(),
    KeyCode::Char(' ') => app.selection.toggle_at_cursor(),
    KeyCode::Char('a') => app.selection.select_all(),
    KeyCode::Char('n') => app.selection.deselect_all(),
    KeyCode::Enter => app.trigger_download(),
    KeyCode::Esc => app.focus = Focus::Url,
    _ => {}
  }
}

fn handle_files_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => app.select_file_next(),
    KeyCode::Up | KeyCode::Char('k') => app.select_file_prev(),
    KeyCode::Enter | KeyCode::Char('o') => app.retrieve_selected_file(),
    KeyCode::Char('r') => app.trigger_refresh_files(),
    KeyCode::Esc => app.focus = Focus::Url,
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6);
  }

  // --- TextField ---

  #[test]
  fn text_field_starts_with_cursor_at_end() {
    let field = TextField::new("downloads");
    assert_eq!(field.cursor(), 9);
  }

  #[test]
  fn text_field_edits_at_cursor() {
    let mut field = TextField::new("ac");
    field.edit(KeyCode::Left);
    field.edit(KeyCode::Char('b'));
    assert_eq!(field.value(), "abc");
    field.edit(KeyCode::Home);
    field.edit(KeyCode::Delete);
    assert_eq!(field.value(), "bc");
    field.edit(KeyCode::End);
    field.edit(KeyCode::Backspace);
    assert_eq!(field.value(), "b");
  }

  #[test]
  fn text_field_handles_multibyte() {
    let mut field = TextField::new("日本");
    field.edit(KeyCode::Left);
    field.edit(KeyCode::Char('é'));
    assert_eq!(field.value(), "日é本");
    assert_eq!(field.cursor(), 2);
  }

  #[test]
  fn text_field_ignores_non_edit_keys() {
    let mut field = TextField::new("x");
    assert!(!field.edit(KeyCode::Enter));
    assert!(!field.edit(KeyCode::Tab));
    assert_eq!(field.value(), "x");
  }

  #[test]
  fn text_field_cursor_is_clamped() {
    let mut field = TextField::new("");
    field.edit(KeyCode::Backspace);
    field.edit(KeyCode::Left);
    field.edit(KeyCode::Right);
    field.edit(KeyCode::Delete);
    assert_eq!(field.cursor(), 0);
    assert_eq!(field.value(), "");
  }
}
