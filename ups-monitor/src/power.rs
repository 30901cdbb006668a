//! Pure derived-metric calculations over the static UPS ratings.

use crate::config::RatingConfig;

const HOURS_PER_DAY: f64 = 24.0;
const HOURS_PER_WEEK: f64 = 168.0;
// 24 * 365.242 / 12, the average month.
const HOURS_PER_MONTH: f64 = 730.484;
const HOURS_PER_YEAR: f64 = 8_765.808;

pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Watts drawn at the reported load percentage, rounded to one decimal.
/// Unparsable input reads as zero load rather than an error.
pub fn watts_from_load(rating: &RatingConfig, load_percent: &str) -> f64 {
    match load_percent.trim().parse::<f64>() {
        Ok(pct) => round_to(rating.ups_watts as f64 * pct / 100.0, 1),
        Err(_) => 0.0,
    }
}

/// Amps at the given voltage, rounded to two decimals; zero when the voltage
/// itself is zero or nonsense.
pub fn amps_from_watts(watts: f64, voltage: f64) -> f64 {
    if voltage == 0.0 || !voltage.is_finite() {
        return 0.0;
    }
    round_to(watts / voltage, 2)
}

pub fn cost_per_hour(rating: &RatingConfig, watts: f64) -> f64 {
    round_to(watts / 1000.0 * rating.electricity_rate, 3)
}

pub fn cost_per_day(rating: &RatingConfig, watts: f64) -> f64 {
    round_to(watts / 1000.0 * rating.electricity_rate * HOURS_PER_DAY, 2)
}

pub fn cost_per_week(rating: &RatingConfig, watts: f64) -> f64 {
    round_to(watts / 1000.0 * rating.electricity_rate * HOURS_PER_WEEK, 2)
}

pub fn cost_per_month(rating: &RatingConfig, watts: f64) -> f64 {
    round_to(watts / 1000.0 * rating.electricity_rate * HOURS_PER_MONTH, 2)
}

pub fn cost_per_year(rating: &RatingConfig, watts: f64) -> f64 {
    round_to(watts / 1000.0 * rating.electricity_rate * HOURS_PER_YEAR, 2)
}

/// Format a duration in whole seconds as zero-padded `HH:MM:SS`.
///
/// Zero is the daemon's "never happened" sentinel and formats as `None`,
/// deliberately distinct from `00:00:00`. Anything that does not parse as a
/// non-negative integer formats as `Unknown`.
pub fn format_duration(seconds: &str) -> String {
    let Ok(secs) = seconds.trim().parse::<i64>() else {
        return "Unknown".to_string();
    };
    if secs < 0 {
        return "Unknown".to_string();
    }
    if secs == 0 {
        return "None".to_string();
    }
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
