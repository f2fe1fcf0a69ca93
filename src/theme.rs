use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub success: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: &[Theme] = &[
  Theme {
    name: "Midnight",
    bg: Color::Rgb(18, 20, 28),
    fg: Color::Rgb(220, 223, 235),
    accent: Color::Rgb(255, 92, 92),
    muted: Color::Rgb(110, 116, 140),
    border: Color::Rgb(58, 62, 82),
    highlight_fg: Color::Rgb(18, 20, 28),
    highlight_bg: Color::Rgb(255, 92, 92),
    stripe_bg: Color::Rgb(24, 27, 37),
    status: Color::Rgb(120, 190, 255),
    error: Color::Rgb(255, 120, 100),
    success: Color::Rgb(120, 220, 140),
    key_fg: Color::Rgb(18, 20, 28),
    key_bg: Color::Rgb(110, 116, 140),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 247, 240),
    fg: Color::Rgb(40, 40, 48),
    accent: Color::Rgb(196, 40, 60),
    muted: Color::Rgb(130, 126, 118),
    border: Color::Rgb(206, 200, 188),
    highlight_fg: Color::Rgb(250, 247, 240),
    highlight_bg: Color::Rgb(196, 40, 60),
    stripe_bg: Color::Rgb(242, 238, 229),
    status: Color::Rgb(40, 110, 190),
    error: Color::Rgb(200, 60, 40),
    success: Color::Rgb(40, 140, 70),
    key_fg: Color::Rgb(250, 247, 240),
    key_bg: Color::Rgb(130, 126, 118),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Magenta,
    muted: Color::DarkGray,
    border: Color::DarkGray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Magenta,
    stripe_bg: Color::Reset,
    status: Color::Cyan,
    error: Color::Red,
    success: Color::Green,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];

/// Index of the theme called `name` (case-insensitive), if any.
pub fn theme_index(name: &str) -> Option<usize> {
  THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn theme_lookup_is_case_insensitive() {
    assert_eq!(theme_index("paper"), Some(1));
    assert_eq!(theme_index("MIDNIGHT"), Some(0));
    assert_eq!(theme_index("nope"), None);
  }
}
