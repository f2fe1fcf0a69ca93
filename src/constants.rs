//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub default_server_url: String,

  // Polling
  pub poll_interval_ms: u64,
  pub request_timeout_secs: u64,

  // Banners
  pub banner_timeout_secs: u64,

  // Output
  /// Output directory value the server resolves to its own default location.
  pub placeholder_output_dir: String,
  pub default_bitrate: String,
  pub bitrates: Vec<String>,

  // Logging
  pub log_file_prefix: String,
}

impl Constants {
  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  pub fn banner_timeout(&self) -> Duration {
    Duration::from_secs(self.banner_timeout_secs)
  }
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.poll_interval(), Duration::from_secs(1));
    assert_eq!(c.banner_timeout(), Duration::from_secs(5));
    assert!(c.bitrates.contains(&c.default_bitrate));
    assert_eq!(c.placeholder_output_dir, "downloads");
  }
}
