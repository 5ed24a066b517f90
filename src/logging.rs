//! Logging setup.
//!
//! The subscriber is built from an explicit [`LogConfig`] and installed for
//! the lifetime of the returned guard; nothing else in the crate touches
//! logger state.

use std::fmt;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::ValueEnum;
use tracing::Level;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt};

/// Level names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    #[value(name = "TRACE")]
    Trace,
    #[value(name = "DEBUG")]
    Debug,
    #[value(name = "INFO")]
    Info,
    #[value(name = "SUCCESS")]
    Success,
    #[default]
    #[value(name = "WARNING")]
    Warning,
    #[value(name = "ERROR")]
    Error,
    #[value(name = "CRITICAL")]
    Critical,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info | LogLevel::Success => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error | LogLevel::Critical => Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Also append logs to this file.
    pub log_file: Option<PathBuf>,
}

/// `level` as the base directive with `rust_log` directives layered on top.
/// Directives that fail to parse are returned alongside the filter.
fn env_filter(level: LogLevel, rust_log: Option<&str>) -> (EnvFilter, Vec<String>) {
    let mut filter = EnvFilter::default().add_directive(level.to_tracing_level().into());
    let mut rejected = Vec::new();
    for raw in rust_log.unwrap_or_default().split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match raw.parse::<Directive>() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(_) => rejected.push(raw.to_string()),
        }
    }
    (filter, rejected)
}

/// Install the subscriber described by `config` until the guard is dropped.
pub fn init(config: &LogConfig) -> anyhow::Result<DefaultGuard> {
    let console = tracing_fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true);

    let file = match &config.log_file {
        Some(path) => {
            let handle = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                tracing_fmt::layer()
                    .with_writer(Mutex::new(handle))
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        None => None,
    };

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, rejected) = env_filter(config.level, rust_log.as_deref());
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file);

    let guard = tracing::subscriber::set_default(subscriber);
    tracing::info!(level = %config.level, "log level set");
    for directive in rejected {
        tracing::warn!(%directive, "ignoring invalid {} directive", EnvFilter::DEFAULT_ENV);
    }
    Ok(guard)
}
