//! Log sink setup
//!
//! Two `tracing-subscriber` fmt layers share one registry: application logs
//! go to the error log (stderr by default), access lines go to the access
//! log (stdout by default).

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::{self, writer::BoxMakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use super::ACCESS_TARGET;
use crate::config::LoggingConfig;

/// Where a sink writes when no file is configured
#[derive(Clone, Copy)]
enum Console {
    Stdout,
    Stderr,
}

/// Install the global subscriber
///
/// Fails if a log file cannot be opened, the level is not a valid filter
/// directive, or a subscriber is already installed.
pub fn init(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Access lines must survive a stricter application level such as "warn"
    let filter = EnvFilter::try_new(format!("{},{ACCESS_TARGET}=info", logging.level))?;

    let app_layer = fmt::layer()
        .with_writer(make_writer(logging.error_log_file.as_deref(), Console::Stderr)?)
        .with_ansi(logging.error_log_file.is_none())
        .with_filter(filter_fn(|meta| meta.target() != ACCESS_TARGET));

    let access_layer = if logging.access_log {
        Some(
            fmt::layer()
                .with_writer(make_writer(logging.access_log_file.as_deref(), Console::Stdout)?)
                .with_ansi(false)
                .without_time()
                .with_level(false)
                .with_target(false)
                .with_filter(filter_fn(|meta| meta.target() == ACCESS_TARGET)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(app_layer)
        .with(access_layer)
        .try_init()?;

    Ok(())
}

fn make_writer(path: Option<&str>, console: Console) -> io::Result<BoxMakeWriter> {
    Ok(match (path, console) {
        (Some(path), _) => BoxMakeWriter::new(Mutex::new(open_log_file(path)?)),
        (None, Console::Stdout) => BoxMakeWriter::new(io::stdout),
        (None, Console::Stderr) => BoxMakeWriter::new(io::stderr),
    })
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}
