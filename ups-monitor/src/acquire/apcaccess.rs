use std::time::Duration;

use apcupsd_client::{parse_status_text, RawStatus};
use tokio::{process::Command, time::timeout};

use super::{Transport, TransportError};

/// Queries the UPS by shelling out to the vendor `apcaccess` tool.
pub struct ApcaccessTransport {
    bin: String,
    host: String,
    timeout: Duration,
}

impl ApcaccessTransport {
    pub fn new(bin: String, host: String, timeout: Duration) -> Self {
        Self { bin, host, timeout }
    }
}

#[async_trait::async_trait]
impl Transport for ApcaccessTransport {
    fn name(&self) -> &'static str {
        "apcaccess"
    }

    async fn fetch(&self) -> Result<RawStatus, TransportError> {
        let output = timeout(
            self.timeout,
            Command::new(&self.bin)
                .arg("-h")
                .arg(&self.host)
                // A timed-out child must not linger past the poll.
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(TransportError::Exit(output.status));
        }

        let fields = parse_status_text(&String::from_utf8_lossy(&output.stdout));
        if fields.is_empty() {
            return Err(TransportError::Malformed);
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_a_transport_error() {
        let transport = ApcaccessTransport::new(
            "/nonexistent/apcaccess".to_string(),
            "localhost".to_string(),
            Duration::from_secs(1),
        );
        assert!(matches!(
            transport.fetch().await,
            Err(TransportError::Io(_))
        ));
    }

    #[tokio::test]
    async fn output_without_fields_is_malformed() {
        // `echo -h localhost` exits zero but prints no key/value lines.
        let transport = ApcaccessTransport::new(
            "echo".to_string(),
            "localhost".to_string(),
            Duration::from_secs(5),
        );
        assert!(matches!(
            transport.fetch().await,
            Err(TransportError::Malformed)
        ));
    }
}
