use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::config::ScheduleConfig;
use crate::log::EventLog;

/// Builds a run configuration whose start instant is `start`.
pub fn schedule_at(start: DateTime<Local>, match_minutes: i64, pause_minutes: i64) -> ScheduleConfig {
    ScheduleConfig {
        day: start.format("%Y-%m-%d").to_string(),
        start_time: start.format("%H:%M:%S").to_string(),
        match_duration: match_minutes,
        pause_duration: pause_minutes,
    }
}

/// Polls the log roughly every millisecond until it holds at least `count`
/// entries. Panics when the timeout elapses first.
pub async fn wait_for_log_len(log: &EventLog, count: usize, timeout: Duration) {
    let deadline = Instant::now() + timeout;

    while log.snapshot().len() < count {
        if Instant::now() >= deadline {
            panic!(
                "log never reached {count} entries, have {:?}",
                log.snapshot()
            );
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{LogEntry, LogEvent};
    use chrono::TimeZone;

    #[test]
    fn schedule_at_formats_day_and_time() {
        let start = Local.with_ymd_and_hms(2099, 1, 1, 10, 0, 0).single().unwrap();
        let config = schedule_at(start, 18, 2);
        assert_eq!(config.day, "2099-01-01");
        assert_eq!(config.start_time, "10:00:00");
        assert_eq!(config.start_instant(start - chrono::Duration::minutes(1)).unwrap(), start);
    }

    #[tokio::test]
    async fn wait_for_log_len_returns_once_reached() {
        let log = EventLog::new();
        let when = Local.with_ymd_and_hms(2099, 1, 1, 10, 0, 0).single().unwrap();
        log.append(LogEntry::new(LogEvent::TimerStarted, when));

        wait_for_log_len(&log, 1, Duration::from_millis(100)).await;
    }

    #[tokio::test]
    #[should_panic(expected = "log never reached")]
    async fn wait_for_log_len_panics_on_timeout() {
        let log = EventLog::new();
        wait_for_log_len(&log, 1, Duration::from_millis(10)).await;
    }
}
