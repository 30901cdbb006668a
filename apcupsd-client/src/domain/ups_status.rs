use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::status::RawStatus;

/// Normalized UPS snapshot: the protocol fields the monitor depends on as
/// typed members, derived power/cost metrics, the static ratings they were
/// derived from, and an open map preserving any vendor field we do not
/// recognize.
///
/// Raw protocol fields stay strings (units already stripped); derived fields
/// are numbers rounded by the calculator. Serialization uses the protocol's
/// upper-case key names so stored blobs stay queryable with `json_extract`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsStatus {
    #[serde(rename = "STATUS", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "LOADPCT", skip_serializing_if = "Option::is_none")]
    pub load_pct: Option<String>,
    #[serde(rename = "LINEV", skip_serializing_if = "Option::is_none")]
    pub line_voltage: Option<String>,
    #[serde(rename = "OUTPUTV", skip_serializing_if = "Option::is_none")]
    pub output_voltage: Option<String>,
    #[serde(rename = "BCHARGE", skip_serializing_if = "Option::is_none")]
    pub battery_charge: Option<String>,
    #[serde(rename = "TIMELEFT", skip_serializing_if = "Option::is_none")]
    pub time_left: Option<String>,
    #[serde(rename = "NUMXFERS", skip_serializing_if = "Option::is_none")]
    pub transfer_count: Option<String>,
    #[serde(rename = "TONBATT", skip_serializing_if = "Option::is_none")]
    pub time_on_battery: Option<String>,
    #[serde(rename = "CUMONBATT", skip_serializing_if = "Option::is_none")]
    pub cum_on_battery: Option<String>,

    #[serde(rename = "WATTS")]
    pub watts: f64,
    #[serde(rename = "AMPS")]
    pub amps: f64,
    #[serde(rename = "VOLTAGE")]
    pub voltage: f64,
    #[serde(rename = "COST_HOUR")]
    pub cost_hour: f64,
    #[serde(rename = "COST_DAILY")]
    pub cost_daily: f64,
    #[serde(rename = "COST_WEEKLY")]
    pub cost_weekly: f64,
    #[serde(rename = "COST_MONTHLY")]
    pub cost_monthly: f64,

    #[serde(rename = "TONBATT_FORMATTED", skip_serializing_if = "Option::is_none")]
    pub time_on_battery_formatted: Option<String>,
    #[serde(rename = "CUMONBATT_FORMATTED", skip_serializing_if = "Option::is_none")]
    pub cum_on_battery_formatted: Option<String>,

    #[serde(rename = "UPS_VA")]
    pub ups_va: u32,
    #[serde(rename = "UPS_WATTS")]
    pub ups_watts: u32,
    #[serde(rename = "POWER_FACTOR")]
    pub power_factor: f64,
    #[serde(rename = "NOMINAL_VOLTAGE")]
    pub nominal_voltage: u32,
    #[serde(rename = "ELECTRICITY_RATE")]
    pub electricity_rate: f64,

    #[serde(rename = "TIMESTAMP")]
    pub timestamp: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl UpsStatus {
    /// Split raw fields into the typed members above; everything unrecognized
    /// lands in `extra`. Derived and config fields are left at their defaults
    /// for the normalizer to fill in.
    pub fn from_fields(mut fields: RawStatus) -> Self {
        Self {
            status: fields.remove("STATUS"),
            load_pct: fields.remove("LOADPCT"),
            line_voltage: fields.remove("LINEV"),
            output_voltage: fields.remove("OUTPUTV"),
            battery_charge: fields.remove("BCHARGE"),
            time_left: fields.remove("TIMELEFT"),
            transfer_count: fields.remove("NUMXFERS"),
            time_on_battery: fields.remove("TONBATT"),
            cum_on_battery: fields.remove("CUMONBATT"),
            extra: fields,
            ..Self::default()
        }
    }
}
