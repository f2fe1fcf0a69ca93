use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, Gauge, List, ListItem, ListState, Padding, Paragraph},
};

use crate::app::{App, Banner, FilesView, Focus};
use crate::format::{format_count, format_duration, format_size};
use crate::input::TextField;
use crate::monitor::ProgressSnapshot;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// New horizontal scroll offset keeping `cursor_col` inside a `width`-column window.
fn follow_cursor(cursor_col: usize, scroll: usize, width: usize) -> usize {
  if cursor_col < scroll {
    cursor_col
  } else if cursor_col >= scroll + width {
    cursor_col.saturating_sub(width) + 1
  } else {
    scroll
  }
}

/// The chars of `s` that fall within display columns `[scroll, scroll + width)`.
fn visible_slice(s: &str, scroll: usize, width: usize) -> String {
  s.chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= scroll)
    .take_while(|(start, _, _)| *start < scroll + width)
    .map(|(_, _, c)| c)
    .collect()
}

fn panel<'a>(theme: &Theme, title: impl Into<Line<'a>>, focused: bool) -> Block<'a> {
  let color = if focused { theme.accent } else { theme.border };
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(color))
    .padding(Padding::horizontal(1))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let progress_h = if app.monitor.panel_visible() { 4 } else { 0 };
  let [header_area, url_area, options_area, body_area, progress_area, status_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(3),
    Constraint::Min(5),
    Constraint::Length(progress_h),
    Constraint::Length(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_url(frame, app, url_area);
  render_options(frame, app, options_area);

  let [info_area, files_area] =
    Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(body_area);
  render_info(frame, app, info_area);
  render_files(frame, app, files_area);

  if let Some(snapshot) = app.monitor.snapshot().filter(|_| app.monitor.panel_visible()) {
    render_progress(frame, theme, snapshot, progress_area);
  }
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let left = Line::from(Span::styled(" ♫ ytmp3 ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let right_text = format!("{}  v{} ", app.api.base_url(), env!("CARGO_PKG_VERSION"));
  let width = right_text.chars().count() as u16;
  let right = Line::from(Span::styled(right_text, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width: width.min(area.width), ..area };
  frame.render_widget(right, right_area);
}

/// Render a single-line field with horizontal scrolling, placing the terminal
/// cursor when focused.
fn render_text_field(
  frame: &mut Frame,
  theme: &Theme,
  field: &mut TextField,
  block: Block,
  placeholder: Option<&str>,
  focused: bool,
  area: Rect,
) {
  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(field.value(), field.cursor());
  field.scroll = follow_cursor(cursor_col, field.scroll, inner_w);

  let paragraph = match placeholder {
    Some(hint) if field.value().is_empty() => {
      Paragraph::new(truncate_str(hint, inner_w)).style(Style::default().fg(theme.muted))
    }
    _ => Paragraph::new(visible_slice(field.value(), field.scroll, inner_w)).style(Style::default().fg(theme.fg)),
  };
  frame.render_widget(paragraph.block(block), area);

  if focused {
    let cursor_x = area.x + 2 + (cursor_col - field.scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_url(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.focus == Focus::Url;
  let block = panel(theme, " YouTube URL ", focused);
  render_text_field(frame, theme, &mut app.url, block, Some("Paste a video or playlist URL"), focused, area);
}

fn render_options(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [bitrate_area, dir_area] = Layout::horizontal([Constraint::Length(18), Constraint::Min(10)]).areas(area);

  let bitrate = Paragraph::new(Line::from(vec![
    Span::styled(app.bitrate().to_string(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)),
    Span::styled("  ^b", Style::default().fg(theme.muted)),
  ]))
  .block(panel(theme, " Bitrate ", false));
  frame.render_widget(bitrate, bitrate_area);

  let focused = app.focus == Focus::OutputDir;
  let block = panel(theme, " Output folder ", focused);
  let hint = app.output_hint.clone();
  render_text_field(frame, theme, &mut app.output_dir, block, hint.as_deref(), focused, dir_area);
}

fn render_info(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  if app.info_busy {
    let block = panel(theme, " Info ", false);
    let text = Paragraph::new(Span::styled("Fetching info…", Style::default().fg(theme.status))).block(block);
    frame.render_widget(text, area);
  } else if app.selection.is_playlist() {
    render_playlist(frame, app, area);
  } else if let Some(video) = &app.video {
    let inner_w = area.width.saturating_sub(4) as usize;
    let mut lines = vec![
      Line::from(Span::styled(
        truncate_str(&video.title, inner_w),
        Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
      )),
      Line::from(""),
    ];
    if let Some(uploader) = &video.uploader {
      lines.push(Line::from(vec![
        Span::styled("Uploader  ", Style::default().fg(theme.muted)),
        Span::styled(truncate_str(uploader, inner_w.saturating_sub(10)), Style::default().fg(theme.fg)),
      ]));
    }
    lines.push(Line::from(vec![
      Span::styled("Duration  ", Style::default().fg(theme.muted)),
      Span::styled(format_duration(video.duration), Style::default().fg(theme.fg)),
    ]));
    if let Some(views) = video.view_count {
      lines.push(Line::from(vec![
        Span::styled("Views     ", Style::default().fg(theme.muted)),
        Span::styled(format_count(views), Style::default().fg(theme.fg)),
      ]));
    }
    frame.render_widget(Paragraph::new(lines).block(panel(theme, " Video ", false)), area);
  } else {
    let text = vec![
      Line::from(""),
      Line::from(Span::styled("YouTube to MP3", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
      Line::from(""),
      Line::from(Span::styled("Paste a URL above, then ^g for info or Enter to download.", Style::default().fg(theme.fg))),
    ];
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(panel(theme, " Info ", false));
    frame.render_widget(paragraph, area);
  }
}

fn render_playlist(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let Some(playlist) = app.selection.playlist() else { return };
  let focused = app.focus == Focus::Playlist;
  // Borders, padding and the highlight symbol
  let inner_w = area.width.saturating_sub(6) as usize;

  let items: Vec<ListItem> = app
    .selection
    .rows()
    .enumerate()
    .map(|(i, row)| {
      let (mark, right, fg) = if row.disabled {
        ("[-]", "Blocked/Removed".to_string(), theme.muted)
      } else {
        (if row.checked { "[x]" } else { "[ ]" }, format_duration(row.entry.duration), theme.fg)
      };
      let prefix = format!("{} {:>3}. ", mark, row.entry.original_index);
      let title_max = inner_w.saturating_sub(prefix.chars().count() + right.chars().count() + 2);
      let title = truncate_str(&row.entry.title, title_max);
      let gap = inner_w.saturating_sub(prefix.chars().count() + title.chars().count() + right.chars().count());
      let mut title_style = Style::default().fg(fg);
      if row.disabled {
        title_style = title_style.add_modifier(Modifier::CROSSED_OUT);
      }
      let line = Line::from(vec![
        Span::styled(prefix, Style::default().fg(if row.checked { theme.accent } else { fg })),
        Span::styled(title, title_style),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(theme.muted)),
      ]);
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      ListItem::new(line).bg(bg)
    })
    .collect();

  let mut title = vec![
    Span::raw(" "),
    Span::styled(truncate_str(&playlist.title, inner_w / 2), Style::default().add_modifier(Modifier::BOLD)),
    Span::raw(format!(" · {} videos · {} selected ", playlist.count, app.selection.count())),
  ];
  if playlist.unavailable_count > 0 {
    title.push(Span::styled(
      format!("({} unavailable) ", playlist.unavailable_count),
      Style::default().fg(theme.muted),
    ));
  }

  let mut list = List::new(items).block(panel(theme, Line::from(title), focused));
  if focused {
    list = list
      .highlight_symbol("▶ ")
      .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  }
  let mut state = ListState::default().with_selected(Some(app.selection.cursor()));
  frame.render_stateful_widget(list, area, &mut state);
}

fn render_files(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.focus == Focus::Files;
  let block = panel(theme, " Downloaded ", focused);
  let inner_w = area.width.saturating_sub(6) as usize;

  let message = match &app.files {
    FilesView::Loading => Some(("Loading…".to_string(), theme.muted)),
    FilesView::Failed(msg) => Some((msg.clone(), theme.error)),
    FilesView::Loaded(files) if files.is_empty() => Some(("No files downloaded yet".to_string(), theme.muted)),
    FilesView::Loaded(_) => None,
  };
  if let Some((text, color)) = message {
    frame.render_widget(Paragraph::new(Span::styled(text, Style::default().fg(color))).block(block), area);
    return;
  }
  let FilesView::Loaded(files) = &app.files else { return };

  let items: Vec<ListItem> = files
    .iter()
    .enumerate()
    .map(|(i, file)| {
      let size = file.size.map(format_size).unwrap_or_default();
      let name = truncate_str(&file.name, inner_w.saturating_sub(size.chars().count() + 2));
      let gap = inner_w.saturating_sub(name.chars().count() + size.chars().count());
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      ListItem::new(Line::from(vec![
        Span::styled(name, Style::default().fg(theme.fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(size, Style::default().fg(theme.muted)),
      ]))
      .bg(bg)
    })
    .collect();

  let mut list = List::new(items).block(block);
  if focused {
    list = list
      .highlight_symbol("▶ ")
      .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  }
  frame.render_stateful_widget(list, area, &mut app.files_state);
}

fn render_progress(frame: &mut Frame, theme: &Theme, snapshot: &ProgressSnapshot, area: Rect) {
  let block = panel(theme, " Progress ", false);
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [gauge_area, stats_area] = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(inner);
  let gauge = Gauge::default()
    .gauge_style(Style::default().fg(theme.accent).bg(theme.stripe_bg))
    .percent(snapshot.percent)
    .label(format!("{}%", snapshot.percent));
  frame.render_widget(gauge, gauge_area);

  let speed_eta = format!("Speed: {}  ETA: {}", snapshot.speed, snapshot.eta);
  let label_w = (stats_area.width as usize).saturating_sub(speed_eta.chars().count() + 2);
  let stats = Line::from(vec![
    Span::styled(truncate_str(&snapshot.label, label_w), Style::default().fg(theme.status)),
    Span::raw("  "),
    Span::styled(speed_eta, Style::default().fg(theme.muted)),
  ]);
  frame.render_widget(stats, stats_area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = match &app.banner {
    Some(Banner::Error(msg)) => (format!(" ⚠  {}", msg.replace('\n', " ")), Style::default().fg(theme.error)),
    Some(Banner::Success(msg)) => (format!(" ✓ {}", msg), Style::default().fg(theme.success)),
    None if app.info_busy => (" ⏳ Loading...".to_string(), Style::default().fg(theme.status)),
    None if app.download_busy => (" ⏳ Downloading...".to_string(), Style::default().fg(theme.status)),
    None => (" Ready".to_string(), Style::default().fg(theme.muted)),
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let mut keys: Vec<(&str, &str)> = match app.focus {
    Focus::Url => vec![("Enter", "Download"), ("^g", "Info")],
    Focus::OutputDir => vec![("Enter", "Load files")],
    Focus::Playlist => vec![("Space", "Toggle"), ("a/n", "All/None"), ("Enter", "Download")],
    Focus::Files => vec![("Enter", "Open"), ("j/k", "Navigate"), ("r", "Refresh")],
  };
  keys.push(("Tab", "Focus"));
  keys.push(("^b", "Bitrate"));
  keys.push(("^t", "Theme"));
  keys.push(if app.focus == Focus::Url && app.url.value().is_empty() { ("Esc", "Quit") } else { ("^c", "Quit") });

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::ApiClient;
  use crate::app::Settings;
  use crate::models::{InfoResponse, MediaInfo, PlaylistInfo, VideoEntry};
  use ratatui::{Terminal, backend::TestBackend};

  // --- helpers ---

  #[test]
  fn display_width_counts_wide_chars() {
    assert_eq!(display_width("abc", 2), 2);
    assert_eq!(display_width("日本語", 2), 4);
  }

  #[test]
  fn truncate_appends_ellipsis() {
    assert_eq!(truncate_str("short", 10), "short");
    assert_eq!(truncate_str("a long title", 6), "a lon…");
  }

  #[test]
  fn scroll_follows_cursor() {
    assert_eq!(follow_cursor(3, 0, 10), 0);
    assert_eq!(follow_cursor(12, 0, 10), 3);
    assert_eq!(follow_cursor(2, 5, 10), 2);
  }

  #[test]
  fn visible_slice_respects_wide_chars() {
    assert_eq!(visible_slice("abcdef", 2, 3), "cde");
    // '日' spans columns 0-1; scrolling to column 1 still shows its tail
    assert_eq!(visible_slice("日本x", 1, 3), "日本");
  }

  // --- rendering ---

  fn render(app: &mut App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|frame| ui(frame, app)).unwrap();
    let buffer = terminal.backend().buffer();
    buffer.content().iter().map(|cell| cell.symbol()).collect()
  }

  fn app() -> App {
    App::new(Settings {
      api: ApiClient::new("http://127.0.0.1:9").unwrap(),
      bitrate: "192k".to_string(),
      output_dir: "downloads".to_string(),
      theme_name: None,
    })
  }

  #[test]
  fn playlist_rows_show_unavailable_entries() {
    let mut a = app();
    a.show_info(InfoResponse {
      info: MediaInfo::Playlist(PlaylistInfo {
        title: "Mix".to_string(),
        count: 1,
        unavailable_count: 1,
        videos: vec![
          VideoEntry { index: 1, original_index: 1, title: "First".into(), duration: Some(75.0), available: true },
          VideoEntry { index: -1, original_index: 2, title: "Gone".into(), duration: None, available: false },
        ],
      }),
      default_downloads_path: None,
    });
    let screen = render(&mut a);
    assert!(screen.contains("1 selected"));
    assert!(screen.contains("[x]"));
    assert!(screen.contains("Blocked/Removed"));
    assert!(screen.contains("192k"));
  }

  #[test]
  fn files_panel_shows_load_error_inline() {
    let mut a = app();
    a.files = FilesView::Failed("Error loading files: boom".into());
    let screen = render(&mut a);
    assert!(screen.contains("Error loading files: boom"));

    a.files = FilesView::Loaded(vec![]);
    assert!(render(&mut a).contains("No files downloaded yet"));
  }

  #[test]
  fn banner_replaces_ready_status() {
    let mut a = app();
    assert!(render(&mut a).contains("Ready"));
    a.set_error("Please enter a YouTube URL");
    assert!(render(&mut a).contains("Please enter a YouTube URL"));
  }
}
