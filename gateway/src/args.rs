use std::{borrow::Cow, fmt, io::IsTerminal, str::FromStr};

use clap::{Parser, ValueEnum};
use logforth::filter::EnvFilter;

/// CLI entry point for the gateway binary.
///
/// Every operational setting beyond logging is loaded from the YAML files
/// `config::load_*` resolves (`AUTH_CONFIG_PATH`, `ACL_CONFIG_PATH`,
/// `LEASE_RATE_LIMIT_CONFIG_PATH`, `QUOTA_CONFIG_PATH`, `TLS_CONFIG_PATH`,
/// `SERVER_CONFIG_PATH`), so only logging stays on the command line.
#[derive(Debug, Parser)]
#[command(name = "gateway", version, long_about = concat!("API gateway v", env!("CARGO_PKG_VERSION")))]
pub struct Args {
    /// Set the logging level, this applies to all spans, logs and trace events.
    #[arg(long = "log", env = "LOG_LEVEL", default_value_t = LogLevel::default())]
    pub log_level: LogLevel,
    /// Set the style of log output
    #[arg(long, env = "LOG_FORMAT", default_value_t = LogStyle::default())]
    pub log_style: LogStyle,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogStyle {
    /// Colorized text, used as the default with TTY output
    Color,
    /// Standard text, used as the default with non-TTY output
    Text,
    /// JSON objects
    Json,
}

impl Default for LogStyle {
    fn default() -> Self {
        if std::io::stdout().is_terminal() {
            LogStyle::Color
        } else {
            LogStyle::Text
        }
    }
}

impl AsRef<str> for LogStyle {
    fn as_ref(&self) -> &str {
        match self {
            LogStyle::Color => "color",
            LogStyle::Text => "text",
            LogStyle::Json => "json",
        }
    }
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogLevel {
    /// Disable logging
    Off,
    /// Only log errors
    Error,
    /// Log errors, and warnings
    Warn,
    /// Log errors, warnings, and info messages
    #[default]
    Info,
    /// Log errors, warnings, info, and debug messages
    Debug,
    /// Log errors, warnings, info, debug, and trace messages
    Trace,
}

impl LogLevel {
    pub fn env_filter(self) -> EnvFilter {
        let filter_str = match self {
            LogLevel::Off => Cow::Borrowed("off"),
            // For other levels, set the default to 'warn' for all crates,
            // but use the selected level for workspace crates
            level => Cow::Owned(format!(
                "warn,gateway={level},gateway_core={level},auth={level},acl={level},circuit_breaker={level},rate_limit={level},quota={level},storage={level},config={level}"
            )),
        };

        EnvFilter::from_str(&filter_str).expect("these are all valid env filters")
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
