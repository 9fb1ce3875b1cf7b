use anyhow::{Result, anyhow};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{Addr, Pinger};

/// HTTP/HTTPS pinger, an endpoint is up when a GET answers 2xx or 3xx
pub struct HttpPinger {
    id: String,
    url: Url,
    client: reqwest::Client,
}

impl HttpPinger {
    pub fn new(id: impl Into<String>, url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| anyhow!("invalid URL {}: {}", url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("unsupported URL scheme: {}", url.scheme()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { id: id.into(), url, client })
    }
}

#[async_trait::async_trait]
impl Pinger for HttpPinger {
    fn addr(&self) -> Addr {
        let host = self.url.host_str().unwrap_or_default();
        let address = match self.url.port_or_known_default() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Addr::new(self.url.scheme(), address)
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    async fn ping(&self, cancel: &CancellationToken) -> Result<()> {
        let request = self.client.get(self.url.clone()).send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(anyhow!("HTTP ping canceled")),
            res = request => res.map_err(|e| anyhow!("HTTP request failed: {}", e))?,
        };

        // Consider 2xx and 3xx as success
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            Ok(())
        } else {
            Err(anyhow!("HTTP check failed with status code: {}", status.as_u16()))
        }
    }
}
