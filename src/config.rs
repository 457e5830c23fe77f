use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// Minutes of match play when a start request leaves the duration out.
pub const DEFAULT_MATCH_MINUTES: i64 = 18;
/// Minutes of pause when a start request leaves the duration out.
pub const DEFAULT_PAUSE_MINUTES: i64 = 2;

/// Per-run configuration, as carried by a start request.
///
/// `day` and `timestamp` name the wall-clock instant the first match starts
/// at, interpreted in local time. Durations are whole minutes; absent or
/// non-positive values fall back to the defaults via [`normalized`].
///
/// [`normalized`]: ScheduleConfig::normalized
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Calendar day the run starts on, `YYYY-MM-DD`.
    #[serde(default)]
    pub day: String,
    /// Time of day the run starts at, `HH:MM:SS`.
    #[serde(rename = "timestamp", default)]
    pub start_time: String,
    #[serde(rename = "matchDuration", default)]
    pub match_duration: i64,
    #[serde(rename = "pauseDuration", default)]
    pub pause_duration: i64,
}

impl ScheduleConfig {
    /// Returns a copy with default durations substituted for absent or
    /// non-positive ones.
    pub fn normalized(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.match_duration <= 0 {
            cfg.match_duration = DEFAULT_MATCH_MINUTES;
        }
        if cfg.pause_duration <= 0 {
            cfg.pause_duration = DEFAULT_PAUSE_MINUTES;
        }
        cfg
    }

    /// Computes the absolute start instant.
    ///
    /// Fails with `InvalidSchedule` when the day or time does not parse, the
    /// combination does not exist in local time, or the instant is not
    /// strictly after `now`.
    pub fn start_instant(&self, now: DateTime<Local>) -> Result<DateTime<Local>, ControlError> {
        let day = NaiveDate::parse_from_str(&self.day, "%Y-%m-%d")
            .map_err(|_| ControlError::InvalidSchedule(format!("invalid day {:?}", self.day)))?;
        let time = NaiveTime::parse_from_str(&self.start_time, "%H:%M:%S").map_err(|_| {
            ControlError::InvalidSchedule(format!("invalid time {:?}", self.start_time))
        })?;

        // A DST fold resolves to the earliest valid instant.
        let start_at = Local
            .from_local_datetime(&day.and_time(time))
            .earliest()
            .ok_or_else(|| {
                ControlError::InvalidSchedule("start time does not exist locally".to_string())
            })?;

        if start_at <= now {
            return Err(ControlError::InvalidSchedule(
                "start time is in the past".to_string(),
            ));
        }

        Ok(start_at)
    }

    pub fn match_period(&self) -> Duration {
        Duration::from_secs((self.match_duration.max(1) as u64).saturating_mul(60))
    }

    pub fn pause_period(&self) -> Duration {
        Duration::from_secs((self.pause_duration.max(1) as u64).saturating_mul(60))
    }
}

/// Tuning for WebSocket connection handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Interval at which heartbeat pings are sent to subscribers.
    pub heartbeat_interval: Duration,
    /// Duration after which an unresponsive subscriber is considered gone.
    pub client_timeout: Duration,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
            client_timeout: Duration::from_secs(10),
        }
    }
}

impl HandlerConfig {
    pub fn for_testing() -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(10),
            client_timeout: Duration::from_millis(50),
        }
    }
}
