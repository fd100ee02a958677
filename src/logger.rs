use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};
use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::fmt::{self as tracing_fmt, MakeWriter, format::FmtSpan};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// `log` sink shared by the library and the CLI
struct TestforgeLogger;

static LOGGER: TestforgeLogger = TestforgeLogger;

static ENABLED: AtomicBool = AtomicBool::new(false);
static TO_STDERR: AtomicBool = AtomicBool::new(false);
static VERBOSE: AtomicBool = AtomicBool::new(false);
static LOG_FILE: Mutex<Option<File>> = Mutex::new(None);

/// Targets that flood the log with connection chatter unless verbose logging is on
const NOISY_TARGETS: &[&str] = &["reqwest", "hyper", "h2", "rustls", "want", "mio"];

fn is_noisy(target: &str) -> bool {
    NOISY_TARGETS.iter().any(|prefix| target.starts_with(prefix))
}

/// Debug for our own targets, info for dependencies, HTTP internals only when verbose
fn accepts(target: &str, level: Level, verbose: bool) -> bool {
    if target.starts_with("testforge") {
        level <= Level::Debug
    } else {
        (verbose || !is_noisy(target)) && level <= Level::Info
    }
}

fn append_to_file(bytes: &[u8]) {
    if let Some(file) = LOG_FILE.lock().as_mut() {
        let _ = file.write_all(bytes).and_then(|()| file.flush());
    }
}

fn format_line(level: Level, target: &str, message: &fmt::Arguments<'_>) -> String {
    format!(
        "{} {level:<5} [{target}] {message}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
    )
}

/// Sends tracing output to the log file only
#[derive(Clone, Copy)]
struct FileWriter;

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        append_to_file(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for FileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        *self
    }
}

impl log::Log for TestforgeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        ENABLED.load(Ordering::Relaxed)
            && accepts(
                metadata.target(),
                metadata.level(),
                VERBOSE.load(Ordering::Relaxed),
            )
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level(), record.target(), record.args());
        append_to_file(line.as_bytes());
        // stderr keeps stdout clean for `--print`
        if TO_STDERR.load(Ordering::Relaxed) {
            eprint!("{line}");
        }
    }

    fn flush(&self) {}
}

/// Install the `log` sink and a `tracing` subscriber writing to the same file.
///
/// Only the first call does any work; later calls report its outcome.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    static OUTCOME: OnceLock<Result<(), String>> = OnceLock::new();

    let outcome = OUTCOME.get_or_init(|| {
        if std::env::var_os("TESTFORGE_VERBOSE").is_some() {
            set_verbose_logging(true);
        }

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("testforge=debug,warn"));
        let file_layer = tracing_fmt::layer()
            .with_timer(tracing_fmt::time::ChronoUtc::rfc_3339())
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .with_writer(FileWriter);
        let tracing = Registry::default()
            .with(filter)
            .with(file_layer)
            .try_init()
            .map_err(|e| e.to_string());

        let log = log::set_logger(&LOGGER)
            .map(|()| log::set_max_level(LevelFilter::Debug))
            .map_err(|e| e.to_string());

        // Either half is enough to get messages into the file
        match (tracing, log) {
            (Err(tracing), Err(log)) => Err(format!(
                "Failed to initialize logging: tracing={tracing}, log={log}"
            )),
            _ => Ok(()),
        }
    });

    outcome.clone().map_err(Into::into)
}

pub fn enable_logging() {
    ENABLED.store(true, Ordering::Relaxed);
}

pub fn disable_logging() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Let HTTP client internals through the filter
pub fn set_verbose_logging(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

/// Append log lines to `file_path`, creating it if needed
pub fn set_log_file(file_path: &str) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)?;
    *LOG_FILE.lock() = Some(file);
    Ok(())
}

pub fn set_log_to_stderr(enabled: bool) {
    TO_STDERR.store(enabled, Ordering::Relaxed);
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

/// Structured event through `tracing`, for fields worth filtering on
#[macro_export]
macro_rules! trace_debug {
    (target: $target:expr, $($arg:tt)*) => {
        tracing::debug!(target: $target, $($arg)*)
    };
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}
