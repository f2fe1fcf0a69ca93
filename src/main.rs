mod api;
mod app;
mod config;
mod constants;
mod error;
mod format;
mod input;
mod models;
mod monitor;
mod selection;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use api::ApiClient;
use app::{App, Settings};
use config::Config;
use constants::constants;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Base URL of the download service (default: saved preference, then http://localhost:5000)
  #[arg(short, long)]
  server: Option<String>,

  /// Folder the server writes MP3s into
  #[arg(short, long)]
  output_dir: Option<String>,

  /// Initial MP3 bitrate, e.g. 192k
  #[arg(short, long)]
  bitrate: Option<String>,

  /// Log filter used when YTMP3_LOG is unset
  #[arg(long, default_value = "info")]
  log_level: String,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print shell completions to stdout
  Completions { shell: clap_complete::Shell },
}

// --- Logging ---

/// Log to a daily rolling file; the terminal belongs to the UI. The returned
/// guard flushes the writer when dropped.
fn init_tracing(default_level: &str) -> Option<WorkerGuard> {
  let dir = config::log_dir()?;
  let appender = tracing_appender::rolling::daily(dir, &constants().log_file_prefix);
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_env("YTMP3_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(Command::Completions { shell }) = args.command {
    clap_complete::generate(shell, &mut Args::command(), env!("CARGO_PKG_NAME"), &mut std::io::stdout());
    return Ok(());
  }

  let _guard = init_tracing(&args.log_level);

  let prefs = Config::load();
  let server = args.server.or(prefs.server_url).unwrap_or_else(|| constants().default_server_url.clone());
  let api = ApiClient::new(&server).with_context(|| format!("Invalid server URL '{}'", server))?;
  let settings = Settings {
    api,
    bitrate: args.bitrate.or(prefs.bitrate).unwrap_or_else(|| constants().default_bitrate.clone()),
    output_dir: args.output_dir.or(prefs.output_dir).unwrap_or_else(|| constants().placeholder_output_dir.clone()),
    theme_name: prefs.theme_name,
  };
  info!(server = %settings.api.base_url(), bitrate = %settings.bitrate, "starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, settings).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, settings: Settings) -> Result<()> {
  let mut app = App::new(settings);
  app.startup().await;
  let banner_timeout = constants().banner_timeout();

  loop {
    app.check_pending();
    app.expire_banner(banner_timeout);

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.monitor.stop();
  app.save_config();
  info!("exiting");
  Ok(())
}
