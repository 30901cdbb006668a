use std::time::Duration;

use apcupsd_client::{NisClient, RawStatus};

use super::{Transport, TransportError};

/// Queries the daemon directly over its NIS socket; the fallback when the
/// `apcaccess` tool is missing or broken.
pub struct NisTransport {
    client: NisClient,
}

impl NisTransport {
    pub fn new(host: String, port: u16, timeout: Duration) -> Self {
        Self {
            client: NisClient::new(host, port).with_timeout(timeout),
        }
    }
}

#[async_trait::async_trait]
impl Transport for NisTransport {
    fn name(&self) -> &'static str {
        "nis"
    }

    async fn fetch(&self) -> Result<RawStatus, TransportError> {
        Ok(self.client.status().await?)
    }
}
