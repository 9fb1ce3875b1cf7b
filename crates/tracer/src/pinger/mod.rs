//! Endpoint capability consumed by the tracer.
//!
//! Anything that can be addressed, identified and pinged can be traced.
//! [`TcpPinger`] and [`HttpPinger`] cover the common cases; other probe
//! mechanisms only need to implement [`Pinger`].

mod http;
mod tcp;

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

pub use http::HttpPinger;
pub use tcp::TcpPinger;

/// Network address of a traced endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Addr {
    /// Name of the network, e.g. "tcp" or "https"
    pub network: String,
    /// Network specific address string, e.g. "host:port"
    pub address: String,
}

impl Addr {
    pub fn new(network: impl Into<String>, address: impl Into<String>) -> Self {
        Self { network: network.into(), address: address.into() }
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.network, self.address)
    }
}

/// Pinger wraps the basic ping operation of a traced endpoint.
#[async_trait::async_trait]
pub trait Pinger: Send + Sync {
    /// Address of the endpoint, only used for reporting
    fn addr(&self) -> Addr;

    /// Unique identifier, tracing a second pinger with the same id replaces
    /// the first one
    fn id(&self) -> String;

    /// Probe the endpoint once.
    ///
    /// `cancel` fires when the probe batch is superseded or the tracer stops;
    /// implementations should give up promptly when it does. Returning `Ok`
    /// means the endpoint is reachable.
    async fn ping(&self, cancel: &CancellationToken) -> anyhow::Result<()>;
}
