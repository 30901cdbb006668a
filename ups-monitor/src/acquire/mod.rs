use std::time::Duration;

use apcupsd_client::{domain::UpsStatus, RawStatus};
use time::UtcOffset;

use crate::{config::AppConfig, normalize::Normalizer};

mod apcaccess;
mod nis;
mod simulate;

pub use apcaccess::ApcaccessTransport;
pub use nis::NisTransport;
pub use simulate::SimulatedTransport;

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("process exited with {0}")]
    Exit(std::process::ExitStatus),
    #[error("no status fields in output")]
    Malformed,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Nis(#[from] apcupsd_client::NisError),
}

#[derive(thiserror::Error, Debug)]
pub enum AcquireError {
    #[error("all transports failed")]
    Exhausted,
}

/// One concrete way of querying the UPS daemon.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    /// Preference order for "the" voltage reading this transport reports.
    fn voltage_fields(&self) -> &[&'static str] {
        &["LINEV"]
    }

    async fn fetch(&self) -> Result<RawStatus, TransportError>;
}

/// Tries an ordered list of transports and normalizes the first success.
///
/// Stateless between polls, so the collector and the live-status API path can
/// share one instance. A transport failure is logged and counted, never
/// raised; only exhausting the whole list surfaces as an error, which callers
/// must treat as "status unavailable" — distinct from a successful snapshot
/// reporting an abnormal UPS state.
pub struct Acquirer {
    transports: Vec<Box<dyn Transport>>,
    normalizer: Normalizer,
}

impl Acquirer {
    pub fn new(transports: Vec<Box<dyn Transport>>, normalizer: Normalizer) -> Self {
        Self {
            transports,
            normalizer,
        }
    }

    pub fn from_config(cfg: &AppConfig, offset: UtcOffset) -> Self {
        let normalizer = Normalizer::new(cfg.rating.clone(), offset);

        let transports: Vec<Box<dyn Transport>> = if cfg.simulate_power_event {
            vec![Box::new(SimulatedTransport)]
        } else {
            let timeout = Duration::from_secs(cfg.ups.timeout_secs);
            vec![
                Box::new(ApcaccessTransport::new(
                    cfg.ups.apcaccess_bin.clone(),
                    cfg.ups.host.clone(),
                    timeout,
                )),
                Box::new(NisTransport::new(
                    cfg.ups.host.clone(),
                    cfg.ups.port,
                    timeout,
                )),
            ]
        };

        Self::new(transports, normalizer)
    }

    pub async fn acquire(&self) -> Result<UpsStatus, AcquireError> {
        for transport in &self.transports {
            match transport.fetch().await {
                Ok(raw) => {
                    metrics::counter!("ups_polls_total", "transport" => transport.name())
                        .increment(1);
                    return Ok(self.normalizer.normalize(raw, transport.voltage_fields()));
                }
                Err(e) => {
                    metrics::counter!("ups_transport_failures_total", "transport" => transport.name())
                        .increment(1);
                    tracing::warn!(
                        transport = transport.name(),
                        error = %e,
                        "transport failed, trying next"
                    );
                }
            }
        }
        Err(AcquireError::Exhausted)
    }
}
