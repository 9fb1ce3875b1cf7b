//! Tracing subscriber setup shared by the workspace binaries.
//!
//! The level defaults to the one passed in and can be overridden through
//! `RUST_LOG`. `RUST_LOG_FORMAT=json` switches to JSON lines.

use std::{env::var, str::FromStr};

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{
    Layer,
    filter::EnvFilter,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// Output format of the log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

impl LogFormat {
    /// Read `RUST_LOG_FORMAT`, falling back to compact output
    pub fn from_env() -> Self {
        var("RUST_LOG_FORMAT").ok().and_then(|raw| raw.parse().ok()).unwrap_or_default()
    }
}

/// Install the global subscriber at `INFO`.
///
/// Calling it twice keeps the first subscriber.
pub fn init() {
    if let Err(error) = try_init(LevelFilter::INFO, LogFormat::from_env()) {
        warn!("Tracing subscriber already installed: {error}");
    }
}

pub fn try_init(level: LevelFilter, format: LogFormat) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(log_layer).try_init()
}
