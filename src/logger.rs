use std::io::Write;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;

use crate::style::Style;

struct GitbatchLogger {
    file: Option<Mutex<std::fs::File>>,
    filter: LevelFilter,
    style: Style,
    start: Instant,
}

impl GitbatchLogger {
    fn echo(&self, record: &Record<'_>) {
        let label = match record.level() {
            Level::Error => self.style.failure("error:"),
            Level::Warn => self.style.warning("warning:"),
            _ => return,
        };
        eprintln!("{label} {}", record.args());
    }
}

impl Log for GitbatchLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        self.echo(record);

        if let Some(ref file) = self.file {
            let elapsed = self.start.elapsed().as_secs_f64();
            let _ = writeln!(
                file.lock(),
                "[{elapsed:.3}s] [{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Level used when `RUST_LOG` is unset or invalid
fn default_filter(has_file: bool) -> LevelFilter {
    if has_file {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Install the global logger.
///
/// Warnings and errors are echoed to stderr. When `log_file` is given, every
/// enabled record is also appended to it. The level comes from `RUST_LOG`.
///
/// # Errors
///
/// Returns `SetLoggerError` if a logger is already installed.
pub fn init(log_file: Option<std::fs::File>) -> Result<(), SetLoggerError> {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| default_filter(log_file.is_some()));

    let logger = GitbatchLogger {
        file: log_file.map(Mutex::new),
        filter,
        style: Style::for_stderr(),
        start: Instant::now(),
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}
