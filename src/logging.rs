//! Leveled logging for the benchmark and its harness.
//!
//! Standard output is reserved for the measurement line, so every output
//! here writes to stderr or to a file. Nothing is logged from inside the
//! timed loop: the driver logs before taking the start reading and after
//! taking the end reading.

use crate::config::LoggingConfig;
use crate::error::{BenchError, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Very verbose
    Trace = 0,
    /// Debug
    Debug = 1,
    /// Info
    Info = 2,
    /// Warning
    Warn = 3,
    /// Error
    Error = 4,
}

impl LogLevel {
    /// Level for a `-v` count: 0 → Warn, 1 → Info, 2 → Debug, 3+ → Trace.
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// A single structured log record.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Creation time
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Log level
    pub level: LogLevel,
    /// Component that produced the entry (`driver`, `campaign`, ...)
    pub component: String,
    /// Message content
    pub message: String,
    /// Additional key/value data, kept sorted for stable output
    pub metadata: BTreeMap<String, String>,
    /// Duration if this is a timing entry
    pub duration: Option<Duration>,
}

impl LogEntry {
    /// Create a new log entry.
    pub fn new(level: LogLevel, component: &str, message: &str) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            level,
            component: component.to_string(),
            message: message.to_string(),
            metadata: BTreeMap::new(),
            duration: None,
        }
    }

    /// Add metadata to the entry.
    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Add a duration to the entry.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    fn timestamp_text(&self) -> String {
        self.timestamp
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string()
    }

    /// Format as a single human-readable line.
    pub fn format(&self) -> String {
        let mut parts = vec![
            format!("[{}]", self.timestamp_text()),
            format!("{:5}", self.level.to_string()),
            self.component.clone(),
            self.message.clone(),
        ];

        if let Some(duration) = self.duration {
            parts.push(format!("duration:{}us", duration.as_micros()));
        }

        if !self.metadata.is_empty() {
            let metadata_str = self
                .metadata
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ");
            parts.push(metadata_str);
        }

        parts.join(" ")
    }

    /// Format as one JSON object.
    pub fn format_json(&self) -> String {
        let mut json_parts = vec![
            format!("\"timestamp\":\"{}\"", self.timestamp_text()),
            format!("\"level\":\"{}\"", self.level),
            format!("\"component\":\"{}\"", escape_json(&self.component)),
            format!("\"message\":\"{}\"", escape_json(&self.message)),
        ];

        if let Some(duration) = self.duration {
            json_parts.push(format!("\"duration_us\":{}", duration.as_micros()));
        }

        if !self.metadata.is_empty() {
            let metadata_json = self
                .metadata
                .iter()
                .map(|(k, v)| format!("\"{}\":\"{}\"", escape_json(k), escape_json(v)))
                .collect::<Vec<_>>()
                .join(",");
            json_parts.push(format!("\"metadata\":{{{}}}", metadata_json));
        }

        format!("{{{}}}", json_parts.join(","))
    }
}

fn escape_json(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Log output destination.
pub trait LogOutput: Send + Sync {
    /// Write a log entry.
    fn write(&self, entry: &LogEntry) -> Result<()>;

    /// Flush buffered output.
    fn flush(&self) -> Result<()>;
}

/// Writes entries to stderr.
#[derive(Debug, Default)]
pub struct ConsoleOutput {
    json_format: bool,
}

impl ConsoleOutput {
    /// Text output.
    pub fn new() -> Self {
        Self { json_format: false }
    }

    /// JSON output.
    pub fn new_json() -> Self {
        Self { json_format: true }
    }
}

impl LogOutput for ConsoleOutput {
    fn write(&self, entry: &LogEntry) -> Result<()> {
        let formatted = if self.json_format {
            entry.format_json()
        } else {
            entry.format()
        };

        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "{}", formatted).map_err(BenchError::Io)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        std::io::stderr().flush().map_err(BenchError::Io)?;
        Ok(())
    }
}

/// Appends entries to a file.
#[derive(Debug)]
pub struct FileOutput {
    path: std::path::PathBuf,
    json_format: bool,
}

impl FileOutput {
    /// Text output to `path`.
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            json_format: false,
        }
    }

    /// JSON output to `path`.
    pub fn new_json<P: AsRef<std::path::Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            json_format: true,
        }
    }
}

impl LogOutput for FileOutput {
    fn write(&self, entry: &LogEntry) -> Result<()> {
        let formatted = if self.json_format {
            entry.format_json()
        } else {
            entry.format()
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(BenchError::Io)?;

        writeln!(file, "{}", formatted).map_err(BenchError::Io)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        // Opened and closed per write.
        Ok(())
    }
}

/// Fans entries out to its outputs above a minimum level.
pub struct Logger {
    min_level: LogLevel,
    outputs: Vec<Box<dyn LogOutput>>,
}

impl Logger {
    /// Logger with console text output at `Info`.
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            outputs: vec![Box::new(ConsoleOutput::new())],
        }
    }

    /// Logger with no outputs; entries are dropped until one is added.
    pub fn silent() -> Self {
        Self {
            min_level: LogLevel::Info,
            outputs: Vec::new(),
        }
    }

    /// Build a logger from configuration.
    ///
    /// With `log_file` set, entries go to the file instead of stderr.
    /// A disabled configuration yields a silent logger.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut logger = Self::silent();
        logger.set_level(config.level);

        if !config.enabled {
            return logger;
        }

        let output: Box<dyn LogOutput> = match (&config.log_file, config.json_format) {
            (Some(path), false) => Box::new(FileOutput::new(path)),
            (Some(path), true) => Box::new(FileOutput::new_json(path)),
            (None, false) => Box::new(ConsoleOutput::new()),
            (None, true) => Box::new(ConsoleOutput::new_json()),
        };
        logger.add_output(output);
        logger
    }

    /// Set the minimum level.
    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    /// Current minimum level.
    pub fn level(&self) -> LogLevel {
        self.min_level
    }

    /// Add an output destination.
    pub fn add_output(&mut self, output: Box<dyn LogOutput>) {
        self.outputs.push(output);
    }

    /// Whether an entry at `level` would be written anywhere.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level && !self.outputs.is_empty()
    }

    /// Log a message.
    pub fn log(&self, level: LogLevel, component: &str, message: &str) {
        if self.enabled(level) {
            self.write_entry(&LogEntry::new(level, component, message));
        }
    }

    /// Log a timing measurement at `Debug`.
    pub fn log_timing(&self, component: &str, operation: &str, duration: Duration) {
        if self.enabled(LogLevel::Debug) {
            let entry = LogEntry::new(
                LogLevel::Debug,
                component,
                &format!("{} completed", operation),
            )
            .with_duration(duration);
            self.write_entry(&entry);
        }
    }

    /// Log an error with context.
    pub fn log_error(&self, component: &str, error: &BenchError, context: &str) {
        let message = format!("{}: {}", context, error);
        self.log(LogLevel::Error, component, &message);
    }

    /// Write a prepared entry, honoring the level filter.
    pub fn log_entry(&self, entry: &LogEntry) {
        if self.enabled(entry.level) {
            self.write_entry(entry);
        }
    }

    fn write_entry(&self, entry: &LogEntry) {
        for output in &self.outputs {
            if let Err(e) = output.write(entry) {
                eprintln!("Failed to write log entry: {}", e);
            }
        }
    }

    /// Flush all outputs.
    pub fn flush(&self) {
        for output in &self.outputs {
            if let Err(e) = output.flush() {
                eprintln!("Failed to flush log output: {}", e);
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

/// Install the global logger from configuration.
///
/// The first call installs; later calls reconfigure the installed logger.
pub fn init_logger(config: &LoggingConfig) {
    let logger = Logger::from_config(config);
    match GLOBAL_LOGGER.get() {
        Some(existing) => {
            if let Ok(mut guard) = existing.lock() {
                *guard = logger;
            }
        }
        None => {
            if let Err(logger) = GLOBAL_LOGGER.set(Mutex::new(logger)) {
                // Lost an init race; apply this configuration anyway.
                if let (Some(existing), Ok(logger)) = (GLOBAL_LOGGER.get(), logger.into_inner()) {
                    if let Ok(mut guard) = existing.lock() {
                        *guard = logger;
                    }
                }
            }
        }
    }
}

/// Run `f` with the global logger, if one is installed.
fn with_global<F: FnOnce(&Logger)>(f: F) {
    if let Some(logger) = GLOBAL_LOGGER.get() {
        if let Ok(logger) = logger.lock() {
            f(&logger);
        }
    }
}

/// Log a message using the global logger.
pub fn log(level: LogLevel, component: &str, message: &str) {
    with_global(|logger| logger.log(level, component, message));
}

/// Log a prepared entry using the global logger.
pub fn log_entry(entry: &LogEntry) {
    with_global(|logger| logger.log_entry(entry));
}

/// Log timing using the global logger.
pub fn log_timing(component: &str, operation: &str, duration: Duration) {
    with_global(|logger| logger.log_timing(component, operation, duration));
}

/// Whether the global logger would write an entry at `level`.
pub fn log_enabled(level: LogLevel) -> bool {
    let mut enabled = false;
    with_global(|logger| enabled = logger.enabled(level));
    enabled
}

/// Flush the global logger.
pub fn flush() {
    with_global(Logger::flush);
}

/// Log a trace-level message using the global logger.
#[macro_export]
macro_rules! log_trace {
    ($component:expr, $($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Trace, $component, &format!($($arg)*))
    };
}

/// Log a debug-level message using the global logger.
#[macro_export]
macro_rules! log_debug {
    ($component:expr, $($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Debug, $component, &format!($($arg)*))
    };
}

/// Log an info-level message using the global logger.
#[macro_export]
macro_rules! log_info {
    ($component:expr, $($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Info, $component, &format!($($arg)*))
    };
}

/// Log a warning-level message using the global logger.
#[macro_export]
macro_rules! log_warn {
    ($component:expr, $($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Warn, $component, &format!($($arg)*))
    };
}

/// Log an error-level message using the global logger.
#[macro_export]
macro_rules! log_error {
    ($component:expr, $($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Error, $component, &format!($($arg)*))
    };
}
