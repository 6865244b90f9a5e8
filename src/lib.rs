//! # dupfree
//!
//! Finds exact duplicate files and visually near-duplicate images.
//!
//! ## Core Philosophy
//! - **Never delete** - the engine only reports; acting on results is up to the caller
//! - **Degrade, don't fail** - unreadable files are skipped, never fatal
//! - **Stay responsive** - every stage honours a cancellation token
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - Walking, grouping, hashing, verification and the pipelines
//! - `events` - Event-driven progress and streamed results (GUI-ready)
//! - `error` - Typed errors per stage
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{DupfreeError, Result};

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
/// Filtering follows `RUST_LOG`, defaulting to `warn`. Console output goes
/// to stderr; with `log_file` set, a plain-text copy is written there too
/// and the returned guard must be kept alive until exit.
pub fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path.file_name().unwrap_or(path.as_os_str());
            let appender = tracing_appender::rolling::never(
                directory.unwrap_or_else(|| Path::new(".")),
                file_name,
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();

    guard
}
