//! Timing scopes and the render debug log.
//!
//! `--perf` prints scope timings to stderr. `--render-debug-log PATH` writes
//! timestamped pipeline events (index rebuilds, block renders, breadcrumb
//! changes) to a file, which is the only practical way to watch the
//! pipeline while the terminal is in raw mode.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOGGER: LazyLock<Mutex<DebugLogger>> =
    LazyLock::new(|| Mutex::new(DebugLogger::new()));

#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        eprintln!("[perf] {}: {:.2} ms", self.name, elapsed_ms);
        log_event("perf.scope", format!("{} {elapsed_ms:.3} ms", self.name));
    }
}

#[derive(Debug)]
struct DebugLogger {
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl DebugLogger {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            writer: None,
        }
    }
}

fn logger() -> MutexGuard<'static, DebugLogger> {
    DEBUG_LOGGER.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Time the rest of the enclosing block when `--perf` is on.
pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

/// Start writing the debug log to `path`, or stop with `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be created.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut logger = logger();
    let Some(path) = path else {
        logger.writer = None;
        return Ok(());
    };
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "outliner render debug log start")?;
    writer.flush()?;
    logger.start = Instant::now();
    logger.writer = Some(writer);
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    logger().writer.is_some()
}

pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let mut logger = logger();
    let elapsed_ms = logger.start.elapsed().as_secs_f64() * 1000.0;
    if let Some(writer) = logger.writer.as_mut() {
        let _ = writeln!(writer, "[{elapsed_ms:>10.3} ms] {name}: {}", detail.as_ref());
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_set_enabled_toggles_runtime_flag() {
        set_enabled(true);
        assert!(is_enabled());

        set_enabled(false);
        assert!(!is_enabled());
    }

    #[test]
    fn test_debug_log_path_enables_logging_and_writes() {
        let temp_file = NamedTempFile::new().unwrap();
        set_debug_log_path(Some(temp_file.path())).unwrap();
        assert!(is_debug_log_enabled());
        log_event("blocks.render", "kind=Full created=1");
        set_debug_log_path(None).unwrap();
        assert!(!is_debug_log_enabled());
        log_event("blocks.render", "dropped");

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("outliner render debug log start"));
        assert!(content.contains("blocks.render: kind=Full created=1"));
        assert!(!content.contains("dropped"));
    }
}
