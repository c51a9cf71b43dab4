//! Parley — terminal chat client with certificate-based sign-in.
//!
//! Startup loads configuration from the application directory, validates
//! the configured key/certificate pair (auto-login) or runs the sign-in
//! form, then enters the chat window. A dedicated reactor thread performs
//! background I/O and posts results to the UI thread over the dispatch
//! bridge.
//!
//! ```bash
//! # Normal start (auto-login when configured)
//! cargo run --bin parley
//!
//! # Always show the sign-in form
//! cargo run --bin parley -- --no-auto-login
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use parley::bootstrap::Bootstrap;
use parley::config;
use parley::login::TerminalLoginPrompt;
use parley::window::MainWindow;

/// CLI arguments parsed by clap.
#[derive(Parser, Debug)]
#[command(version, about = "Terminal chat client with certificate-based sign-in")]
struct CliArgs {
    /// Application directory holding config.toml and the default
    /// credential files (default: `~/.config/parley`).
    #[arg(long)]
    app_dir: Option<PathBuf>,

    /// Always show the sign-in form, even when auto-login is configured.
    #[arg(long)]
    no_auto_login: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "PARLEY_LOG")]
    log_level: String,

    /// Path to log file (default: `$TMPDIR/parley.log`).
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() {
    let cli = CliArgs::parse();

    // Initialize logging before any terminal setup (logs go to a file,
    // never stdout, since ratatui owns the terminal).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("parley starting");

    let Some(app_dir) = cli.app_dir.or_else(config::app_dir) else {
        eprintln!("could not determine an application directory; pass --app-dir");
        std::process::exit(1);
    };

    let mut bootstrap = Bootstrap::new(app_dir, TerminalLoginPrompt, MainWindow::new())
        .with_forced_prompt(cli.no_auto_login);
    let code = bootstrap.run();

    tracing::info!(code, "parley exiting");
    std::process::exit(code);
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure
/// all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("parley.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
