use apcupsd_client::{domain::UpsStatus, RawStatus};
use time::{
    format_description::FormatItem, macros::format_description, OffsetDateTime, UtcOffset,
};

use crate::{config::RatingConfig, power};

/// Unit tokens apcupsd appends to values; stripped so fields parse as plain
/// numbers. The bare `C` covers Celsius readings like `ITEMP`.
const UNIT_SUFFIXES: [&str; 6] = ["Percent", "Volts", "Minutes", "Seconds", "Hz", "C"];

/// Human-facing timestamp stamped into each snapshot.
const TIMESTAMP_FORMAT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Strip one trailing unit token: `25.0 Percent` → `25.0`, `22.5 C` → `22.5`.
fn strip_units(value: &str) -> String {
    let trimmed = value.trim();
    for unit in UNIT_SUFFIXES {
        if let Some(rest) = trimmed.strip_suffix(unit) {
            return rest.trim_end().to_string();
        }
    }
    trimmed.to_string()
}

/// Turns raw transport fields into a complete [`UpsStatus`] snapshot: units
/// stripped, power metrics derived, static ratings injected, durations
/// formatted, timestamp stamped with the local clock.
pub struct Normalizer {
    rating: RatingConfig,
    offset: UtcOffset,
}

impl Normalizer {
    pub fn new(rating: RatingConfig, offset: UtcOffset) -> Self {
        Self { rating, offset }
    }

    /// `voltage_fields` is the transport's preference order for "the" voltage
    /// reading; the first parseable entry wins, falling back to the nominal
    /// rating. A bad `LOADPCT` degrades the derived metrics to zero without
    /// discarding the rest of the record.
    pub fn normalize(&self, mut raw: RawStatus, voltage_fields: &[&str]) -> UpsStatus {
        for value in raw.values_mut() {
            *value = strip_units(value);
        }

        let mut status = UpsStatus::from_fields(raw);

        let load = status.load_pct.as_deref().unwrap_or("0");
        if load.parse::<f64>().is_err() {
            tracing::warn!(load_pct = load, "could not calculate power metrics");
        }
        let watts = power::watts_from_load(&self.rating, load);

        let voltage = voltage_fields
            .iter()
            .find_map(|field| self.voltage_of(&status, field))
            .unwrap_or(self.rating.nominal_voltage as f64);

        status.watts = watts;
        status.amps = power::amps_from_watts(watts, voltage);
        status.voltage = voltage;
        status.cost_hour = power::cost_per_hour(&self.rating, watts);
        status.cost_daily = power::cost_per_day(&self.rating, watts);
        status.cost_weekly = power::cost_per_week(&self.rating, watts);
        status.cost_monthly = power::cost_per_month(&self.rating, watts);

        status.time_on_battery_formatted =
            status.time_on_battery.as_deref().map(power::format_duration);
        status.cum_on_battery_formatted =
            status.cum_on_battery.as_deref().map(power::format_duration);

        status.ups_va = self.rating.ups_va;
        status.ups_watts = self.rating.ups_watts;
        status.power_factor = self.rating.power_factor;
        status.nominal_voltage = self.rating.nominal_voltage;
        status.electricity_rate = self.rating.electricity_rate;

        status.timestamp = OffsetDateTime::now_utc()
            .to_offset(self.offset)
            .format(TIMESTAMP_FORMAT)
            .unwrap_or_default();

        status
    }

    fn voltage_of(&self, status: &UpsStatus, field: &str) -> Option<f64> {
        let value = match field {
            "LINEV" => status.line_voltage.as_deref(),
            "OUTPUTV" => status.output_voltage.as_deref(),
            other => status.extra.get(other).map(String::as_str),
        }?;
        value.parse().ok()
    }
}
