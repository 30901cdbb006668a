use serde::{Deserialize, Serialize};

/// One persisted, timestamped snapshot of UPS status.
///
/// `data` is treated as an opaque blob by the store; raw readings carry a
/// serialized [`super::UpsStatus`], aggregated history points carry bucket
/// averages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: String,
    pub data: serde_json::Value,
}
