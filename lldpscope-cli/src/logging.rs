//! tracing subscriber setup for the CLI and the capture worker

use lldpscope_core::{Error, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count, applied when `RUST_LOG` is unset
pub fn default_directive(verbose: u8, floor: &str) -> String {
    match verbose {
        0 => floor.to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

/// Log to stderr
pub fn init_console(verbose: u8, floor: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&default_directive(verbose, floor)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Io(std::io::Error::other(format!("Failed to set logger: {}", e))))
}

/// Append to `path` without colors; used by the capture worker
pub fn init_file(path: &Path, verbose: u8) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&default_directive(verbose, "info")))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| Error::Io(std::io::Error::other(format!("Failed to set logger: {}", e))))
}
