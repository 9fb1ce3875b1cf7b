use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::pinger::Addr;

/// Topic used to publish connection discovery messages.
pub const TOPIC_CONN: &str = "topic_connection";

/// Reachability of an endpoint as reported by a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Online,
    Offline,
}

impl std::fmt::Display for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connectivity::Online => write!(f, "online"),
            Connectivity::Offline => write!(f, "offline"),
        }
    }
}

/// Outcome of one probe against one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier of the probed endpoint
    pub id: String,

    /// Address the endpoint reported when the probe was launched
    pub addr: Addr,

    /// Error message, `None` when the endpoint answered
    pub error: Option<String>,

    /// Time the probe took in milliseconds
    pub latency_ms: u64,

    /// Timestamp when the probe completed
    pub timestamp: SystemTime,
}

impl Message {
    /// Build a message from a probe outcome
    pub fn new(id: String, addr: Addr, outcome: anyhow::Result<()>, latency_ms: u64) -> Self {
        Self {
            id,
            addr,
            // `{:#}` keeps the whole context chain on one line
            error: outcome.err().map(|e| format!("{e:#}")),
            latency_ms,
            timestamp: SystemTime::now(),
        }
    }

    pub fn connectivity(&self) -> Connectivity {
        if self.error.is_none() { Connectivity::Online } else { Connectivity::Offline }
    }

    pub fn is_online(&self) -> bool {
        self.connectivity() == Connectivity::Online
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    fn addr() -> Addr {
        Addr::new("tcp", "host:port")
    }

    #[test]
    fn test_successful_probe_is_online() {
        let m = Message::new("fake".into(), addr(), Ok(()), 3);

        assert_eq!(m.connectivity(), Connectivity::Online);
        assert!(m.is_online());
        assert!(m.error.is_none());
        assert_eq!(m.latency_ms, 3);
    }

    #[test]
    fn test_failed_probe_keeps_error_chain() {
        let outcome: anyhow::Result<()> =
            Err(anyhow!("connection refused")).context("ping failed");
        let m = Message::new("fake".into(), addr(), outcome, 0);

        assert_eq!(m.connectivity(), Connectivity::Offline);
        assert_eq!(m.error.as_deref(), Some("ping failed: connection refused"));
    }

    #[test]
    fn test_message_serialization() {
        let m = Message::new("fake".into(), addr(), Err(anyhow!("should fail")), 12);

        let serialized = serde_json::to_string(&m).unwrap();
        let deserialized: Message = serde_json::from_str(&serialized).unwrap();

        assert_eq!(m, deserialized);
        assert_eq!(serde_json::to_string(&Connectivity::Offline).unwrap(), "\"offline\"");
    }
}
