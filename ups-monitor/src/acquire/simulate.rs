use apcupsd_client::RawStatus;

use super::{Transport, TransportError};

/// Fixed battery-discharge snapshot served when simulation mode is enabled,
/// so the event and charting paths can be exercised without a real outage.
pub struct SimulatedTransport;

const SNAPSHOT: [(&str, &str); 16] = [
    ("STATUS", "ONBATT"),
    ("LOADPCT", "25.0"),
    ("BCHARGE", "85.0"),
    ("TIMELEFT", "45.0"),
    ("LINEV", "0.0"),
    ("OUTPUTV", "121.6"),
    ("LINEFREQ", "0.0"),
    ("ITEMP", "22.5"),
    ("BATTV", "54.2"),
    ("NUMXFERS", "1"),
    ("TONBATT", "300"),
    ("CUMONBATT", "1800"),
    ("LASTXFER", "Low line voltage"),
    ("MODEL", "Smart-UPS 3000 XL"),
    ("SERIALNO", "JS0745010850"),
    ("FIRMWARE", "691.17.D"),
];

#[async_trait::async_trait]
impl Transport for SimulatedTransport {
    fn name(&self) -> &'static str {
        "simulated"
    }

    /// Line voltage reads zero during the simulated outage; the output
    /// voltage is the representative reading.
    fn voltage_fields(&self) -> &[&'static str] {
        &["OUTPUTV"]
    }

    async fn fetch(&self) -> Result<RawStatus, TransportError> {
        Ok(SNAPSHOT
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect())
    }
}
