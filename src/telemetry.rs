use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const FILTER_ENV: &str = "INSIGHTQA_LOG";
const FORMAT_ENV: &str = "INSIGHTQA_LOG_FORMAT";
const DEFAULT_FILTER: &str = "warn";

pub const LOG_FILE_NAME: &str = "insightqa.log";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn json_requested() -> bool {
    matches!(std::env::var(FORMAT_ENV).as_deref(), Ok("json"))
}

pub fn init_stderr() {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_target(true)
        .with_writer(io::stderr);

    if json_requested() {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Appends to `path`; the file is created if needed.
pub fn init_file(path: &Path) -> io::Result<()> {
    let file: File = OpenOptions::new().create(true).append(true).open(path)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    if json_requested() {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
