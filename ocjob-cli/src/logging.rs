//! Logging setup

use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log levels accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    /// Filter directive for this level; HTTP internals stay at `warn`
    pub fn directive(self) -> String {
        let level = match self {
            LogLevel::Critical | LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        format!("{},hyper=warn,hyper_util=warn,reqwest=warn", level)
    }
}

/// Initialise tracing on stderr
///
/// `RUST_LOG` takes precedence over `--log-level`. Stdout is left to job
/// logs and the summary line.
pub fn init(level: LogLevel) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.directive().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive() {
        assert!(LogLevel::Critical.directive().starts_with("error,"));
        assert!(LogLevel::Warning.directive().starts_with("warn,"));
        assert!(LogLevel::Debug.directive().starts_with("debug,"));
    }
}
