//! Process clock.
//!
//! Built once at process start and shared by reference (e.g. behind an `Arc`)
//! with whatever reports uptime. There is no global instance.

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Start time, monotonic uptime and the last recorded restart of this process.
#[derive(Debug)]
pub struct ProcessClock {
    started_at: DateTime<Utc>,
    started: Instant,
    last_restart: RwLock<Option<DateTime<Utc>>>,
}

impl ProcessClock {
    /// Capture "now" as the process start.
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            last_restart: RwLock::new(None),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Monotonic time since [`ProcessClock::start`].
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn last_restart(&self) -> Option<DateTime<Utc>> {
        *self
            .last_restart
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a restart of the serving components at the current time.
    pub fn record_restart(&self) -> DateTime<Utc> {
        let now = Utc::now();
        *self
            .last_restart
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(now);
        ::tracing::info!(restarted_at = %now, "restart recorded");
        now
    }

    pub fn report(&self) -> UptimeReport {
        let uptime = self.uptime();
        UptimeReport {
            uptime: format!("{:.3?}", uptime),
            uptime_seconds: uptime.as_secs(),
            start_time: self.started_at,
            last_restart: self.last_restart(),
            uptime_string: format_uptime(uptime),
        }
    }
}

/// Serializable uptime snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UptimeReport {
    pub uptime: String,
    pub uptime_seconds: u64,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_restart: Option<DateTime<Utc>>,
    pub uptime_string: String,
}

/// Human-readable uptime, dropping leading zero units: `45s`, `2m 5s`, `1h 0m 3s`, `3d 4h 0m 0s`.
pub fn format_uptime(d: Duration) -> String {
    let total = d.as_secs();
    let days = total / 86_400;
    let hours = (total / 3_600) % 24;
    let minutes = (total / 60) % 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_uptime_drops_leading_zero_units() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0s");
        assert_eq!(format_uptime(Duration::from_secs(45)), "45s");
        assert_eq!(format_uptime(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_uptime(Duration::from_secs(3_603)), "1h 0m 3s");
        assert_eq!(format_uptime(Duration::from_secs(3 * 86_400 + 4 * 3_600)), "3d 4h 0m 0s");
    }

    #[test]
    fn format_uptime_ignores_sub_second_part() {
        assert_eq!(format_uptime(Duration::from_millis(59_999)), "59s");
    }

    #[test]
    fn fresh_clock_has_no_restart() {
        let clock = ProcessClock::start();
        assert!(clock.last_restart().is_none());
        assert!(clock.started_at() <= Utc::now());
    }

    #[test]
    fn record_restart_is_visible_in_report() {
        let clock = ProcessClock::start();
        let at = clock.record_restart();

        let report = clock.report();
        assert_eq!(report.last_restart, Some(at));
        assert_eq!(report.start_time, clock.started_at());
    }

    #[test]
    fn report_omits_last_restart_until_recorded() {
        let clock = ProcessClock::start();
        let json = serde_json::to_value(clock.report()).unwrap();

        assert!(json.get("last_restart").is_none());
        assert!(json["uptime_string"].as_str().unwrap().ends_with('s'));
        assert!(json.get("start_time").is_some());
    }
}
