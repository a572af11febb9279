use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Local;
use tracing::Level;

use crate::config::AppConfig;
use crate::errors::CoreError;

/// Placeholder replaced with the start-up time in the log file path.
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// Install the global tracing subscriber described by `config`.
///
/// DEBUG level when `debug_log` is set, INFO otherwise. With
/// `enable_file_log` the output goes to the configured file (directories are
/// created), otherwise to stderr. Returns the log file path, if any.
///
/// A subscriber installed earlier (by a test harness, or a second call) is
/// left in place.
pub fn init_logging(config: &AppConfig) -> Result<Option<PathBuf>, CoreError> {
    let level = if config.debug_log_active() {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if config.enable_file_log() {
        let path = resolve_log_path(&config.log_filepath());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        if builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .is_err()
        {
            tracing::debug!("Tracing subscriber already installed");
        }
        Ok(Some(path))
    } else {
        if builder.try_init().is_err() {
            tracing::debug!("Tracing subscriber already installed");
        }
        Ok(None)
    }
}

/// Fill in `{timestamp}` with a filesystem-safe local time.
pub fn resolve_log_path(template: &str) -> PathBuf {
    let stamp = Local::now().format("%Y-%m-%dT%H_%M_%S").to_string();
    PathBuf::from(template.replace(TIMESTAMP_PLACEHOLDER, &stamp))
}
