use thiserror::Error;

/// Errors surfaced by user actions against the download service.
#[derive(Debug, Error)]
pub enum ClientError {
  /// Rejected locally before any request was sent.
  #[error("{0}")]
  Validation(String),

  /// Non-2xx response carrying the server's message.
  #[error("{0}")]
  Request(String),

  /// The server could not find a working FFmpeg installation.
  #[error("{0}\n\nPlease install FFmpeg. See FFMPEG_SETUP.md for instructions.")]
  Ffmpeg(String),

  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("invalid server URL '{url}': {reason}")]
  InvalidUrl { url: String, reason: String },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ffmpeg_error_appends_setup_guidance() {
    let err = ClientError::Ffmpeg("ffprobe not found".into());
    let text = err.to_string();
    assert!(text.starts_with("ffprobe not found\n\n"));
    assert!(text.contains("FFMPEG_SETUP.md"));
  }

  #[test]
  fn validation_error_is_shown_verbatim() {
    let err = ClientError::Validation("Please enter a YouTube URL".into());
    assert_eq!(err.to_string(), "Please enter a YouTube URL");
  }
}
