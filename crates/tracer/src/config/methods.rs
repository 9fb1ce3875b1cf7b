use std::time::Duration;

use super::types::{MIN_REFRESH_RATE, TracerConfig, TracerConfigBuilder};

impl TracerConfig {
    /// Set the refresh rate, clamped to [`MIN_REFRESH_RATE`]
    pub fn with_refresh_rate(mut self, refresh_rate: Duration) -> Self {
        self.refresh_rate = refresh_rate.max(MIN_REFRESH_RATE);
        self
    }
}

impl TracerConfigBuilder {
    /// Build the configuration
    pub fn build(self) -> TracerConfig {
        self.config
    }

    /// Set the refresh rate, clamped to [`MIN_REFRESH_RATE`]
    pub fn refresh_rate(mut self, refresh_rate: Duration) -> Self {
        self.config.refresh_rate = refresh_rate.max(MIN_REFRESH_RATE);
        self
    }
}
