use serde::Deserialize;
use std::{env, fs, str::FromStr};

/// Connection settings for the monitored apcupsd daemon.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpsdConfig {
    pub host: String,
    pub port: u16,
    /// Path or name of the vendor status tool tried before the NIS socket.
    pub apcaccess_bin: String,
    /// Per-transport timeout; bounds both the subprocess and the socket.
    pub timeout_secs: u64,
}

impl Default for UpsdConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3551,
            apcaccess_bin: "apcaccess".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Static plate ratings of the UPS plus the billing rate, the inputs to every
/// derived metric.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub ups_va: u32,
    pub ups_watts: u32,
    pub power_factor: f64,
    pub nominal_voltage: u32,
    /// Dollars per kWh.
    pub electricity_rate: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            ups_va: 3000,
            ups_watts: 2700,
            power_factor: 0.9,
            nominal_voltage: 120,
            electricity_rate: 0.124,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub db_path: String,
    pub max_connections: u32,
    pub retention_days: u32,
    /// Hard cap on points returned by one history query.
    pub max_points: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "ups_history.db".to_string(),
            max_connections: 5,
            retention_days: 7,
            max_points: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub interval_secs: u64,
    /// Consecutive failures before the flat backoff pause kicks in.
    pub max_failures: u32,
    pub backoff_secs: u64,
    pub cleanup_interval_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_failures: 10,
            backoff_secs: 60,
            cleanup_interval_secs: 1800,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ups: UpsdConfig,
    pub rating: RatingConfig,
    pub store: StoreConfig,
    pub collector: CollectorConfig,
    pub http: HttpConfig,
    pub metrics: Option<MetricsConfig>,
    pub simulate_power_event: bool,
    pub debug: bool,
}

impl AppConfig {
    /// Load the TOML config named by `UPS_MONITOR_CONFIG` (default
    /// `ups-monitor.toml`), then apply environment overrides on top. A missing
    /// file is only an error when the env var names it explicitly.
    pub fn load() -> anyhow::Result<Self> {
        let explicit = env::var("UPS_MONITOR_CONFIG").ok();
        let path = explicit
            .clone()
            .unwrap_or_else(|| "ups-monitor.toml".to_string());

        let mut cfg: AppConfig = match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if explicit.is_some() => {
                return Err(anyhow::anyhow!("cannot read config {path}: {e}"));
            }
            Err(_) => AppConfig::default(),
        };

        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = env::var("APCUPSD_HOST") {
            self.ups.host = v;
        }
        if let Some(v) = env_parse("APCUPSD_PORT") {
            self.ups.port = v;
        }
        if let Some(v) = env_parse("UPS_VA") {
            self.rating.ups_va = v;
        }
        if let Some(v) = env_parse("UPS_WATTS") {
            self.rating.ups_watts = v;
        }
        if let Some(v) = env_parse("POWER_FACTOR") {
            self.rating.power_factor = v;
        }
        if let Some(v) = env_parse("NOMINAL_VOLTAGE") {
            self.rating.nominal_voltage = v;
        }
        if let Some(v) = env_parse("ELECTRICITY_RATE") {
            self.rating.electricity_rate = v;
        }
        if let Ok(v) = env::var("SIMULATE_POWER_EVENT") {
            self.simulate_power_event = v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = env::var("DEBUG") {
            self.debug = v.eq_ignore_ascii_case("true");
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_rated_hardware() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.rating.ups_va, 3000);
        assert_eq!(cfg.rating.ups_watts, 2700);
        assert_eq!(cfg.rating.nominal_voltage, 120);
        assert_eq!(cfg.ups.port, 3551);
        assert_eq!(cfg.collector.interval_secs, 5);
        assert_eq!(cfg.store.retention_days, 7);
        assert!(!cfg.simulate_power_event);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg: AppConfig = toml::from_str(
            r#"
            simulate_power_event = true

            [ups]
            host = "10.0.0.13"

            [rating]
            electricity_rate = 0.31

            [metrics]
            bind_addr = "127.0.0.1:9090"
            "#,
        )
        .unwrap();

        assert!(cfg.simulate_power_event);
        assert_eq!(cfg.ups.host, "10.0.0.13");
        assert_eq!(cfg.ups.port, 3551);
        assert_eq!(cfg.rating.electricity_rate, 0.31);
        assert_eq!(cfg.rating.ups_watts, 2700);
        assert_eq!(cfg.metrics.unwrap().bind_addr, "127.0.0.1:9090");
    }
}
