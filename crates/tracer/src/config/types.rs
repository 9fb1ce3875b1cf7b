use std::time::Duration;

/// Interval between two probe batches when nothing triggers a refresh.
pub const DEFAULT_REFRESH_RATE: Duration = Duration::from_secs(4);

/// Shortest refresh rate the scheduler accepts, lower values are clamped.
pub const MIN_REFRESH_RATE: Duration = Duration::from_millis(1);

/// Configuration options for a [`Tracer`](crate::Tracer)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracerConfig {
    /// Time the scheduler waits for a refresh signal before probing anyway.
    ///
    /// Probes still running when the next batch starts never report, so this
    /// must exceed the slowest endpoint's probe latency.
    pub refresh_rate: Duration,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self { refresh_rate: DEFAULT_REFRESH_RATE }
    }
}

impl TracerConfig {
    /// Create a new configuration builder
    pub fn builder() -> TracerConfigBuilder {
        TracerConfigBuilder::default()
    }

    /// Refresh rate the scheduler runs with, never below [`MIN_REFRESH_RATE`]
    pub fn effective_refresh_rate(&self) -> Duration {
        self.refresh_rate.max(MIN_REFRESH_RATE)
    }
}

/// Builder for TracerConfig
#[derive(Debug, Default)]
pub struct TracerConfigBuilder {
    pub(crate) config: TracerConfig,
}
