use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::PathBuf,
};

use anyhow::Result;
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::{json, Value};

/// Replay output: human lines on stdout, optional JSON lines in a file.
pub struct Logger {
    json_file: Option<File>,
    quiet: bool,
}

impl Logger {
    pub fn new(path: Option<PathBuf>, quiet: bool) -> Result<Self> {
        let json_file = match path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(file)
            }
            None => None,
        };
        Ok(Self { json_file, quiet })
    }

    pub fn line(&mut self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", message.as_ref());
        }
    }

    pub fn warn(&mut self, message: impl AsRef<str>) {
        eprintln!("{}", message.as_ref());
        self.record(json!({ "kind": "warn", "msg": message.as_ref() }));
    }

    pub fn record(&mut self, entry: Value) {
        let Some(file) = &mut self.json_file else {
            return;
        };
        let _ = writeln!(file, "{}", entry);
        let _ = file.flush();
    }
}

/// Routes the library's `log` output to stderr so it does not mix with the
/// replay transcript.
struct StderrLog {
    level: LevelFilter,
}

impl Log for StderrLog {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        if message.starts_with("NET_EVENT ") {
            eprintln!("{message}");
            return;
        }
        let tag = match record.level() {
            Level::Error => "E",
            Level::Warn => "W",
            Level::Info => "I",
            Level::Debug => "D",
            Level::Trace => "T",
        };
        eprintln!("[{tag}] {message}");
    }

    fn flush(&self) {}
}

pub fn install(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_boxed_logger(Box::new(StderrLog { level })).is_ok() {
        log::set_max_level(level);
    }
}
