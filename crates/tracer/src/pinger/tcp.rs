use anyhow::{Result, anyhow};
use std::time::Duration;
use tokio::{net::TcpStream, time::timeout};
use tokio_util::sync::CancellationToken;

use super::{Addr, Pinger};

/// TCP port pinger, an endpoint is up when it accepts a connection
pub struct TcpPinger {
    id: String,
    target: String,
    timeout_duration: Duration,
}

impl TcpPinger {
    pub fn new(
        id: impl Into<String>,
        target: impl Into<String>,
        timeout_duration: Duration,
    ) -> Self {
        Self { id: id.into(), target: target.into(), timeout_duration }
    }
}

#[async_trait::async_trait]
impl Pinger for TcpPinger {
    fn addr(&self) -> Addr {
        Addr::new("tcp", self.target.as_str())
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    async fn ping(&self, cancel: &CancellationToken) -> Result<()> {
        let connect = timeout(self.timeout_duration, TcpStream::connect(self.target.as_str()));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(anyhow!("TCP ping canceled")),
            res = connect => {
                res.map_err(|_| anyhow!("TCP connection timeout"))?
                    .map_err(|e| anyhow!("TCP connection failed: {}", e))?;
                Ok(())
            }
        }
    }
}
