use chrono::Duration;
use fleetsim_reservation::{EngineSettings, NotifierDelays, WatcherSettings};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub fleet_controller: FleetControllerConfig,
    pub delays: DelayConfig,
    pub watcher: WatcherConfig,
    pub trip: TripConfig,
    pub call_center: CallCenterConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8282 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FleetControllerConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for FleetControllerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/tako-fc".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Notification delays, in seconds
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DelayConfig {
    pub status_step_secs: u64,
    pub trip_start_secs: u64,
    pub trip_end_secs: u64,
    pub trip_data_secs: u64,
    pub trip_segment_secs: u64,
    pub trip_complete_secs: u64,
    pub driver_late_secs: u64,
    pub rejected_access_secs: u64,
    pub call_center_request_secs: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            status_step_secs: 5,
            trip_start_secs: 30,
            trip_end_secs: 30,
            trip_data_secs: 5,
            trip_segment_secs: 5,
            trip_complete_secs: 10,
            driver_late_secs: 5,
            rejected_access_secs: 30,
            call_center_request_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WatcherConfig {
    pub tick_millis: u64,
    pub idle_timeout_secs: i64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            tick_millis: 1000,
            idle_timeout_secs: fleetsim_reservation::DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TripConfig {
    pub segment_distance_km: u32,
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            segment_distance_km: fleetsim_trip::DEFAULT_SEGMENT_DISTANCE_KM,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CallCenterConfig {
    /// Zero keeps unanswered requests forever
    pub correlation_ttl_secs: i64,
}

impl Default for CallCenterConfig {
    fn default() -> Self {
        Self {
            correlation_ttl_secs: fleetsim_reservation::DEFAULT_CORRELATION_TTL_SECS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `FLEETSIM__SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("FLEETSIM").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Engine settings derived from this config. Durations that do not fit
    /// in a timestamp delta are rejected.
    pub fn engine_settings(&self) -> Result<EngineSettings, config::ConfigError> {
        let secs = std::time::Duration::from_secs;
        let d = &self.delays;

        let idle_timeout = signed_seconds("watcher.idle_timeout_secs", self.watcher.idle_timeout_secs)?;
        let ttl_secs = self.call_center.correlation_ttl_secs;
        let correlation_ttl = if ttl_secs > 0 {
            Some(signed_seconds("call_center.correlation_ttl_secs", ttl_secs)?)
        } else {
            None
        };

        Ok(EngineSettings {
            delays: NotifierDelays {
                status_step: secs(d.status_step_secs),
                trip_start: secs(d.trip_start_secs),
                trip_end: secs(d.trip_end_secs),
                trip_data: secs(d.trip_data_secs),
                trip_segment: secs(d.trip_segment_secs),
                trip_complete: secs(d.trip_complete_secs),
                driver_late: secs(d.driver_late_secs),
                rejected_access: secs(d.rejected_access_secs),
                call_center_request: secs(d.call_center_request_secs),
            },
            watcher: WatcherSettings {
                tick: std::time::Duration::from_millis(self.watcher.tick_millis.max(1)),
                idle_timeout,
            },
            segment_distance_km: self.trip.segment_distance_km,
            correlation_ttl,
        })
    }
}

fn signed_seconds(key: &str, value: i64) -> Result<Duration, config::ConfigError> {
    if value < 0 {
        return Err(config::ConfigError::Message(format!("{} must not be negative", key)));
    }
    Duration::try_seconds(value)
        .ok_or_else(|| config::ConfigError::Message(format!("{} is out of range: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_need_no_files() {
        let config: Config = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8282);
        assert_eq!(config.fleet_controller.endpoint, "http://localhost:8080/tako-fc");
        assert_eq!(config.delays.trip_start_secs, 30);
        assert_eq!(config.call_center.correlation_ttl_secs, 86_400);
    }

    #[test]
    fn test_partial_override() {
        let config: Config = config::Config::builder()
            .set_override("server.port", 9000)
            .unwrap()
            .set_override("delays.trip_end_secs", 1)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.delays.trip_end_secs, 1);
        assert_eq!(config.delays.trip_start_secs, 30);
    }

    #[test]
    fn test_engine_settings() {
        let mut config = Config::default();
        config.watcher.tick_millis = 250;
        config.call_center.correlation_ttl_secs = 0;

        let settings = config.engine_settings().unwrap();
        assert_eq!(settings.watcher.tick, std::time::Duration::from_millis(250));
        assert_eq!(settings.delays.trip_complete, std::time::Duration::from_secs(10));
        assert_eq!(settings.segment_distance_km, 5);
        assert!(settings.correlation_ttl.is_none());
    }

    #[test]
    fn test_out_of_range_durations_rejected() {
        let mut config = Config::default();
        config.watcher.idle_timeout_secs = i64::MAX;
        assert!(config.engine_settings().is_err());

        let mut config = Config::default();
        config.watcher.idle_timeout_secs = -5;
        assert!(config.engine_settings().is_err());

        let mut config = Config::default();
        config.call_center.correlation_ttl_secs = i64::MAX;
        assert!(config.engine_settings().is_err());
    }
}
