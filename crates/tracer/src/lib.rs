//! Tracer - liveness monitoring for network endpoints
//!
//! A [`Tracer`] periodically pings every registered [`Pinger`] and publishes
//! one [`Message`] per probe outcome on [`TOPIC_CONN`] through an injected
//! [`PubSub`] transport. It only detects connectivity changes; reacting to
//! them is left to subscribers.

pub mod config;
pub mod engine;
pub mod error;
pub mod message;
pub mod pinger;
pub mod pubsub;

// Re-export main types
pub use config::{TracerConfig, TracerConfigBuilder};
pub use engine::{Status, Tracer};
pub use error::{PubSubError, TracerError};
pub use message::{Connectivity, Message, TOPIC_CONN};
pub use pinger::{Addr, HttpPinger, Pinger, TcpPinger};
pub use pubsub::{CancelFunc, Command, Hub, PubSub};

/// Re-export so pinger implementations don't need their own dependency
pub use tokio_util::sync::CancellationToken;

/// Tracer result type
pub type Result<T> = std::result::Result<T, TracerError>;
