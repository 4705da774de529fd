//! Leveled, zero-dependency logging for the `OxideX` crates.
//!
//! Records carry a [`Level`], the module path of the call site and the
//! formatted message. They are handed to a process-wide [`Sink`], which
//! writes colored lines to stderr unless replaced with [`set_sink`].
//!
//! The initial level is read from the `OXIDEX_LOG` environment variable the
//! first time the logger is touched, falling back to [`Level::Info`].
//!
//! # Example
//!
//! ```
//! use oxidex_log::{debug, info, trace, Level};
//!
//! oxidex_log::set_level(Level::Debug);
//!
//! let live = 3;
//! info!("{} handles live", live);
//! debug!("released {:?}", [1, 2, 3]);
//! trace!("filtered out at debug level");
//! ```

use std::fmt::{self, Arguments};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock};

/// Environment variable consulted for the initial level.
pub const LEVEL_ENV: &str = "OXIDEX_LOG";

/// Severity of a log record, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Failures the caller has to act on.
    Error = 0,
    /// Suspicious but recoverable situations.
    Warn = 1,
    /// High-level progress.
    Info = 2,
    /// Diagnostics for developers.
    Debug = 3,
    /// Per-operation tracing.
    Trace = 4,
}

impl Level {
    const fn color_code(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }

    /// Returns the upper-case name of this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Level::Error,
            1 => Level::Warn,
            2 => Level::Info,
            3 => Level::Debug,
            _ => Level::Trace,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Level`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError {
    input: String,
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid log level: {}", self.input)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a level name, ignoring case.
    ///
    /// ```
    /// use oxidex_log::Level;
    ///
    /// assert_eq!("trace".parse::<Level>(), Ok(Level::Trace));
    /// assert!("loud".parse::<Level>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Level::Error),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "INFO" => Ok(Level::Info),
            "DEBUG" => Ok(Level::Debug),
            "TRACE" => Ok(Level::Trace),
            _ => Err(ParseLevelError {
                input: s.to_owned(),
            }),
        }
    }
}

/// A single log record as seen by a [`Sink`].
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    /// Severity of the record.
    pub level: Level,
    /// Module path of the call site.
    pub target: &'a str,
    /// The formatted message.
    pub args: Arguments<'a>,
}

/// Destination for records that pass the level filter.
pub type Sink = fn(&Record<'_>);

/// Writes a colored line to stderr.
pub fn stderr_sink(record: &Record<'_>) {
    const RESET: &str = "\x1b[0m";

    let color = record.level.color_code();
    eprintln!(
        "{color}[{}]{RESET} {}: {}",
        record.level, record.target, record.args
    );
}

/// The process-wide logger.
pub struct Logger {
    level: AtomicU8,
    sink: RwLock<Sink>,
}

impl Logger {
    const fn new(level: Level) -> Self {
        Logger {
            level: AtomicU8::new(level as u8),
            sink: RwLock::new(stderr_sink as Sink),
        }
    }

    /// Builds a logger whose level comes from [`LEVEL_ENV`].
    ///
    /// Unset or unparsable values leave the level at `Info`.
    fn from_env() -> Self {
        let level = std::env::var(LEVEL_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(Level::Info);
        Logger::new(level)
    }

    /// Sets the least severe level that is still emitted.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    /// Returns the current level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Checks whether a record at `level` would be emitted.
    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 <= self.level.load(Ordering::Relaxed)
    }

    /// Replaces the sink, returning the previous one.
    pub fn set_sink(&self, sink: Sink) -> Sink {
        let mut slot = self.sink.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, sink)
    }

    fn emit(&self, record: &Record<'_>) {
        let sink = *self.sink.read().unwrap_or_else(PoisonError::into_inner);
        sink(record);
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Returns the process-wide logger, initializing it from the environment.
///
/// ```
/// let logger = oxidex_log::get_logger();
/// logger.set_level(oxidex_log::Level::Warn);
/// assert!(!logger.enabled(oxidex_log::Level::Info));
/// ```
pub fn get_logger() -> &'static Logger {
    LOGGER.get_or_init(Logger::from_env)
}

/// Sets the level of the global logger.
pub fn set_level(level: Level) {
    get_logger().set_level(level);
}

/// Sets the level of the global logger from its name.
///
/// # Errors
///
/// Returns [`ParseLevelError`] if `s` does not name a level; the current
/// level is left untouched.
pub fn set_level_from_str(s: &str) -> Result<(), ParseLevelError> {
    set_level(s.parse()?);
    Ok(())
}

/// Routes all further records to `sink`, returning the previous sink.
pub fn set_sink(sink: Sink) -> Sink {
    get_logger().set_sink(sink)
}

#[doc(hidden)]
pub fn __log_with_target(level: Level, target: &str, args: Arguments<'_>) {
    let logger = get_logger();
    if !logger.enabled(level) {
        return;
    }

    logger.emit(&Record {
        level,
        target,
        args,
    });
}

/// Logs at an explicit level.
///
/// ```
/// use oxidex_log::{log, Level};
///
/// log!(level: Level::Info, "pool capacity {}", 256);
/// ```
#[macro_export]
macro_rules! log {
    (level: $level:expr, $($arg:tt)*) => {
        {
            let level = $level;
            if $crate::get_logger().enabled(level) {
                $crate::__log_with_target(
                    level,
                    module_path!(),
                    format_args!($($arg)*)
                );
            }
        }
    };
}

/// Logs at [`Level::Error`].
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Error, $($arg)*)
    };
}

/// Logs at [`Level::Warn`].
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Warn, $($arg)*)
    };
}

/// Logs at [`Level::Info`].
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Info, $($arg)*)
    };
}

/// Logs at [`Level::Debug`].
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Debug, $($arg)*)
    };
}

/// Logs at [`Level::Trace`].
///
/// ```
/// use oxidex_log::trace;
///
/// # oxidex_log::set_level(oxidex_log::Level::Trace);
/// trace!("released {:p}", &0u8);
/// ```
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Trace, $($arg)*)
    };
}
