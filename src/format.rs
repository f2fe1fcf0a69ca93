//! Human-readable renderings of speeds, durations and counts.

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// `2.00 MB/s` at or above one megabyte per second (after rounding to two
/// decimals), `0.5 KB/s` below it, `--` when unknown.
pub fn format_speed(bytes_per_sec: Option<f64>) -> String {
  let Some(speed) = bytes_per_sec.filter(|s| *s > 0.0) else {
    return "--".to_string();
  };
  let mb = (speed / MIB * 100.0).round() / 100.0;
  if mb >= 1.0 { format!("{:.2} MB/s", mb) } else { format!("{:.1} KB/s", speed / KIB) }
}

/// Remaining time as `m:ss`, or `--:--` when unknown or zero.
pub fn format_eta(eta_secs: Option<f64>) -> String {
  match eta_secs.filter(|s| *s > 0.0) {
    Some(eta) => {
      let total = eta.floor() as u64;
      format!("{}:{:02}", total / 60, total % 60)
    }
    None => "--:--".to_string(),
  }
}

/// Media length as `h:mm:ss` or `m:ss`; `Unknown` when absent or zero.
pub fn format_duration(secs: Option<f64>) -> String {
  let Some(secs) = secs.filter(|s| *s > 0.0) else {
    return "Unknown".to_string();
  };
  let total = secs.floor() as u64;
  let hours = total / 3600;
  let minutes = (total % 3600) / 60;
  let seconds = total % 60;
  if hours > 0 { format!("{}:{:02}:{:02}", hours, minutes, seconds) } else { format!("{}:{:02}", minutes, seconds) }
}

/// Thousands-separated integer, e.g. `1,234,567`.
pub fn format_count(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}

/// File size in the largest fitting binary unit.
pub fn format_size(bytes: u64) -> String {
  let b = bytes as f64;
  if b >= MIB {
    format!("{:.1} MB", b / MIB)
  } else if b >= KIB {
    format!("{:.1} KB", b / KIB)
  } else {
    format!("{} B", bytes)
  }
}
