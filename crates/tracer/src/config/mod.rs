//! Tracer configuration.
//!
//! The tracer has a single tunable, the refresh rate of its probe loop.

mod methods;
mod types;

pub use types::{DEFAULT_REFRESH_RATE, MIN_REFRESH_RATE, TracerConfig, TracerConfigBuilder};
