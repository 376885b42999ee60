//! Process logging: rolling log files plus a console echo.
//!
//! # Responsibility
//! - Turn the configured level and directory into validated [`LogSettings`].
//! - Start one `flexi_logger` backend per process.
//! - Echo `info`+ records to stderr as `LEVEL message`, so every CLI run shows
//!   the confirmations the services emit (`Note added: "..."`,
//!   `Items saved. Count=3`, ...).
//!
//! # Invariants
//! - Files receive every record at the configured level in detailed format.
//! - A second start with the same directory is a no-op; another directory is
//!   rejected while a logger is active.

use crate::config::AppConfig;
use flexi_logger::{
    Cleanup, Criterion, DeferredNow, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info, Record};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "coursekit";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 5;
const PANIC_MESSAGE_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    settings: LogSettings,
    handle: LoggerHandle,
}

#[derive(Debug)]
pub enum LoggingError {
    UnknownLevel(String),
    EmptyDirectory,
    CreateDirectory {
        dir: PathBuf,
        source: std::io::Error,
    },
    /// `flexi_logger` refused the specification or failed to start.
    Backend(String),
    AlreadyActive {
        active_dir: PathBuf,
        requested_dir: PathBuf,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::EmptyDirectory => write!(f, "log directory cannot be empty"),
            Self::CreateDirectory { dir, source } => {
                write!(f, "failed to create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(message) => write!(f, "failed to start logger: {message}"),
            Self::AlreadyActive {
                active_dir,
                requested_dir,
            } => write!(
                f,
                "logging already writes to `{}`; cannot switch to `{}`",
                active_dir.display(),
                requested_dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDirectory { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Validated logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: &'static str,
    /// Always absolute.
    pub dir: PathBuf,
}

impl LogSettings {
    /// Normalizes `level` and resolves a relative `dir` against `base`.
    pub fn new(level: &str, dir: &Path, base: &Path) -> Result<Self, LoggingError> {
        let level = normalize_level(level)?;
        if dir.as_os_str().is_empty() || dir.to_string_lossy().trim().is_empty() {
            return Err(LoggingError::EmptyDirectory);
        }
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            base.join(dir)
        };
        Ok(Self { level, dir })
    }

    /// Reads `log_level` and `log_dir` from the resolved configuration.
    pub fn from_config(config: &AppConfig, base: &Path) -> Result<Self, LoggingError> {
        Self::new(&config.log_level, &config.log_dir, base)
    }
}

/// Starts the process logger.
///
/// Installs a panic hook that records panics as `event=panic` before the
/// default hook runs.
pub fn init_logging(settings: &LogSettings) -> Result<(), LoggingError> {
    let active = match ACTIVE.get() {
        Some(active) => active,
        None => ACTIVE.get_or_try_init(|| start_logger(settings))?,
    };

    if active.settings.dir != settings.dir {
        return Err(LoggingError::AlreadyActive {
            active_dir: active.settings.dir.clone(),
            requested_dir: settings.dir.clone(),
        });
    }
    Ok(())
}

/// Settings of the running logger, if one was started.
pub fn logging_status() -> Option<LogSettings> {
    ACTIVE.get().map(|active| active.settings.clone())
}

/// Flushes buffered file output. The logger lives in a static and is never
/// dropped, so the binary calls this before exiting.
pub fn flush_logs() {
    if let Some(active) = ACTIVE.get() {
        active.handle.flush();
    }
}

/// Level used when neither config nor environment sets one.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Stderr line format: level padded to five columns, then the message.
pub fn console_format(
    w: &mut dyn Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> std::io::Result<()> {
    write!(w, "{:<5} {}", record.level(), record.args())
}

fn start_logger(settings: &LogSettings) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|source| LoggingError::CreateDirectory {
        dir: settings.dir.clone(),
        source,
    })?;

    let handle = Logger::try_with_str(settings.level)
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(
            FileSpec::default()
                .directory(settings.dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .duplicate_to_stderr(Duplicate::Info)
        .format_for_stderr(console_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook();
    info!(
        "event=logging_init module=logging status=ok level={} dir={} version={}",
        settings.level,
        settings.dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        settings: settings.clone(),
        handle,
    })
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        _ => Err(LoggingError::UnknownLevel(level.trim().to_string())),
    }
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic module=logging status=error location={location} message={}",
            panic_message(info.payload())
        );
        previous(info);
    }));
}

/// First line of a panic payload, capped so note text never floods the log.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string payload>");
    text.lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(PANIC_MESSAGE_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        console_format, flush_logs, init_logging, logging_status, panic_message, LogSettings,
        LoggingError,
    };
    use crate::config::AppConfig;
    use flexi_logger::DeferredNow;
    use log::{Level, Record};
    use std::any::Any;
    use std::path::{Path, PathBuf};

    fn render(level: Level, message: &str) -> String {
        let mut out = Vec::new();
        console_format(
            &mut out,
            &mut DeferredNow::new(),
            &Record::builder()
                .level(level)
                .target("coursekit_core::service::notes_service")
                .args(format_args!("{message}"))
                .build(),
        )
        .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn console_echo_shows_level_and_message_only() {
        assert_eq!(
            render(Level::Info, "Note added: \"buy milk\""),
            "INFO  Note added: \"buy milk\""
        );
        assert_eq!(
            render(Level::Error, "Sync GET error: GET failed: 500 Internal Server Error"),
            "ERROR Sync GET error: GET failed: 500 Internal Server Error"
        );
        assert_eq!(
            render(Level::Info, "event=product_create module=catalog status=ok id=p003"),
            "INFO  event=product_create module=catalog status=ok id=p003"
        );
    }

    #[test]
    fn settings_come_from_config_and_resolve_relative_dirs() {
        let config = AppConfig {
            log_level: " Warning ".to_string(),
            log_dir: PathBuf::from("logs"),
            ..AppConfig::default()
        };
        let settings = LogSettings::from_config(&config, Path::new("/srv/coursekit")).unwrap();
        assert_eq!(settings.level, "warn");
        assert_eq!(settings.dir, PathBuf::from("/srv/coursekit/logs"));

        let absolute = LogSettings::new("info", Path::new("/var/log/ck"), Path::new("/x")).unwrap();
        assert_eq!(absolute.dir, PathBuf::from("/var/log/ck"));
    }

    #[test]
    fn settings_reject_unknown_level_and_blank_dir() {
        assert!(matches!(
            LogSettings::new("verbose", Path::new("/tmp"), Path::new("/")),
            Err(LoggingError::UnknownLevel(level)) if level == "verbose"
        ));
        assert!(matches!(
            LogSettings::new("info", Path::new(""), Path::new("/")),
            Err(LoggingError::EmptyDirectory)
        ));
    }

    #[test]
    fn panic_message_keeps_first_line_only() {
        let owned: Box<dyn Any + Send> = Box::new("boom\nsecret note".to_string());
        assert_eq!(panic_message(owned.as_ref()), "boom");

        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(other.as_ref()), "<non-string payload>");
    }

    #[test]
    fn second_start_with_same_dir_is_a_no_op_and_other_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LogSettings::new("info", &dir.path().join("logs"), Path::new("/")).unwrap();

        init_logging(&settings).expect("first start");
        init_logging(&settings).expect("same directory");
        assert_eq!(logging_status(), Some(settings.clone()));

        let other = LogSettings::new("info", &dir.path().join("other"), Path::new("/")).unwrap();
        assert!(matches!(
            init_logging(&other),
            Err(LoggingError::AlreadyActive { .. })
        ));

        log::info!("event=logging_test module=logging status=ok");
        flush_logs();
        let has_log_file = std::fs::read_dir(&settings.dir)
            .unwrap()
            .filter_map(Result::ok)
            .any(|entry| entry.file_name().to_string_lossy().starts_with("coursekit"));
        assert!(has_log_file);
    }
}
