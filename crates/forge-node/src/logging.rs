//! Structured logging via `tracing` + `tracing-subscriber`, grounded on the
//! pack's service-crate logging module: a `Once`-gated global subscriber
//! composed from an `EnvFilter` layer and a format layer chosen at startup.

use std::str::FromStr;
use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INIT: Once = Once::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    format: LogFormat,
    with_thread_names: bool,
}

impl LoggingConfig {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            with_thread_names: false,
        }
    }

    pub fn with_thread_names(mut self, value: bool) -> Self {
        self.with_thread_names = value;
        self
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(LogFormat::Plain)
    }
}

/// Install the global subscriber. Safe to call more than once per process —
/// only the first call takes effect, matching the pack's `Once`-gated setup
/// (tests and the binary entry point can both call this unconditionally).
pub fn init(config: LoggingConfig) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = Registry::default().with(env_filter);
        match config.format {
            LogFormat::Json => {
                let layer = fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(config.with_thread_names);
                registry.with(layer).init();
            }
            LogFormat::Plain => {
                let layer = fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_thread_names(config.with_thread_names);
                registry.with(layer).init();
            }
        }
    });
}
