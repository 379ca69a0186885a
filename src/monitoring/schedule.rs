//! Time rules for the polling loop: the daily operating window, the
//! post-alert cooldown, and how long to sleep when either one blocks a poll.
//!
//! Everything here is a pure function of `now` and the last alert time, so
//! the rules are tested without waiting on a real clock.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::time::Duration;

use crate::core::config::{MAX_COOLDOWN_HOURS, MAX_SLEEP_SECS};
use crate::core::ScheduleConfig;

#[derive(Debug, Clone)]
pub struct Schedule {
    config: ScheduleConfig,
}

impl Schedule {
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn timezone(&self) -> Tz {
        self.config.timezone
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_hours() * 3600)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_secs)
    }

    // Clamped so an unvalidated config cannot overflow the arithmetic below.
    fn cooldown_hours(&self) -> u64 {
        self.config.alert_cooldown_hours.min(MAX_COOLDOWN_HOURS)
    }

    pub fn off_hours_recheck(&self) -> Duration {
        Duration::from_secs(self.config.off_hours_recheck_secs)
    }

    fn max_scheduled_sleep(&self) -> Duration {
        Duration::from_secs(self.config.max_scheduled_sleep_secs.min(MAX_SLEEP_SECS))
    }

    /// Local hour in `[start, end)`.
    pub fn is_within_operating_hours(&self, now: DateTime<Utc>) -> bool {
        let hour = now.with_timezone(&self.config.timezone).hour();
        hour >= self.config.operating_start_hour && hour < self.config.operating_end_hour
    }

    pub fn should_pause_after_alert(
        &self,
        last_alert_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        match last_alert_time {
            Some(alerted_at) => now - alerted_at < self.cooldown_chrono(),
            None => false,
        }
    }

    /// Sleep imposed by the cooldown or the operating window, capped so the
    /// loop re-evaluates at least once per cap. `None` means poll now.
    pub fn compute_sleep_duration(
        &self,
        last_alert_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        if let Some(alerted_at) = last_alert_time {
            if self.should_pause_after_alert(last_alert_time, now) {
                let remaining = self.cooldown_chrono() - (now - alerted_at);
                return Some(self.capped(remaining));
            }
        }

        if !self.is_within_operating_hours(now) {
            let until_open = self.next_window_start(now) - now;
            return Some(self.capped(until_open));
        }

        None
    }

    /// Next local `start_hour:00`: today if still before it, otherwise tomorrow.
    pub fn next_window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let tz = self.config.timezone;
        let local = now.with_timezone(&tz);

        let mut date = local.date_naive();
        if local.hour() >= self.config.operating_start_hour {
            date = date.succ_opt().unwrap_or(date);
        }

        let opening = date.and_hms_opt(self.config.operating_start_hour, 0, 0);
        match opening.and_then(|naive| tz.from_local_datetime(&naive).earliest()) {
            Some(start) => start.with_timezone(&Utc),
            // Opening falls in a DST gap; re-check after one capped sleep.
            None => now + self.max_scheduled_sleep_chrono(),
        }
    }

    fn capped(&self, wait: ChronoDuration) -> Duration {
        wait.to_std()
            .unwrap_or(Duration::ZERO)
            .min(self.max_scheduled_sleep())
    }

    fn cooldown_chrono(&self) -> ChronoDuration {
        ChronoDuration::hours(self.cooldown_hours() as i64)
    }

    fn max_scheduled_sleep_chrono(&self) -> ChronoDuration {
        ChronoDuration::seconds(self.config.max_scheduled_sleep_secs.min(MAX_SLEEP_SECS) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Shanghai;

    fn schedule() -> Schedule {
        Schedule::new(ScheduleConfig::default())
    }

    fn local(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Shanghai
            .with_ymd_and_hms(2024, 5, 1, h, m, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_operating_hours_boundaries() {
        let schedule = schedule();
        assert!(schedule.is_within_operating_hours(local(14, 0, 0)));
        assert!(schedule.is_within_operating_hours(local(22, 59, 0)));
        assert!(!schedule.is_within_operating_hours(local(13, 59, 0)));
        assert!(!schedule.is_within_operating_hours(local(23, 0, 0)));
    }

    #[test]
    fn test_operating_hours_use_configured_zone() {
        // 14:30 in Shanghai is 06:30 UTC.
        let now = local(14, 30, 0);
        assert_eq!(now.hour(), 6);

        let utc_schedule = Schedule::new(ScheduleConfig {
            timezone: chrono_tz::UTC,
            ..ScheduleConfig::default()
        });
        assert!(schedule().is_within_operating_hours(now));
        assert!(!utc_schedule.is_within_operating_hours(now));
    }

    #[test]
    fn test_no_alert_no_pause() {
        assert!(!schedule().should_pause_after_alert(None, local(15, 0, 0)));
    }

    #[test]
    fn test_cooldown_sleep_is_capped_at_one_hour() {
        let schedule = schedule();
        let now = local(15, 0, 0);
        let alerted = Some(now - ChronoDuration::hours(10));

        assert!(schedule.should_pause_after_alert(alerted, now));
        assert_eq!(
            schedule.compute_sleep_duration(alerted, now),
            Some(Duration::from_secs(3600))
        );
    }

    #[test]
    fn test_cooldown_tail_sleeps_remaining_time() {
        let schedule = schedule();
        let now = local(15, 0, 0);
        let alerted = Some(now - ChronoDuration::hours(24) + ChronoDuration::minutes(20));

        assert_eq!(
            schedule.compute_sleep_duration(alerted, now),
            Some(Duration::from_secs(20 * 60))
        );
    }

    #[test]
    fn test_cooldown_expires_at_exactly_24h() {
        let schedule = schedule();
        let now = local(15, 0, 0);
        let alerted = Some(now - ChronoDuration::hours(24));

        assert!(!schedule.should_pause_after_alert(alerted, now));
        assert_eq!(schedule.compute_sleep_duration(alerted, now), None);
    }

    #[test]
    fn test_cooldown_takes_priority_over_window() {
        let schedule = schedule();
        let now = local(3, 0, 0);
        let alerted = Some(now - ChronoDuration::hours(23) - ChronoDuration::minutes(50));

        assert_eq!(
            schedule.compute_sleep_duration(alerted, now),
            Some(Duration::from_secs(10 * 60))
        );
    }

    #[test]
    fn test_before_window_sleeps_until_opening() {
        let schedule = schedule();
        assert_eq!(
            schedule.compute_sleep_duration(None, local(13, 30, 0)),
            Some(Duration::from_secs(30 * 60))
        );
        assert_eq!(
            schedule.compute_sleep_duration(None, local(9, 0, 0)),
            Some(Duration::from_secs(3600))
        );
    }

    #[test]
    fn test_after_window_targets_tomorrow() {
        let schedule = schedule();
        let now = local(23, 30, 0);

        let next = schedule.next_window_start(now);
        assert_eq!(next - now, ChronoDuration::hours(14) + ChronoDuration::minutes(30));
        assert_eq!(schedule.compute_sleep_duration(None, now), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_oversized_cooldown_is_clamped() {
        let schedule = Schedule::new(ScheduleConfig {
            alert_cooldown_hours: 3_000_000_000_000_000,
            max_scheduled_sleep_secs: u64::MAX,
            ..ScheduleConfig::default()
        });
        let now = local(15, 0, 0);

        assert_eq!(schedule.cooldown(), Duration::from_secs(MAX_SLEEP_SECS));
        assert!(schedule.should_pause_after_alert(Some(now), now));
        assert_eq!(
            schedule.compute_sleep_duration(Some(now), now),
            Some(Duration::from_secs(MAX_SLEEP_SECS))
        );
    }

    #[test]
    fn test_inside_window_polls() {
        assert_eq!(schedule().compute_sleep_duration(None, local(15, 0, 0)), None);
    }

    #[test]
    fn test_window_recheck_unreachable_after_sleep_rules() {
        let schedule = schedule();
        for hour in 0..24 {
            let now = local(hour, 30, 0);
            if schedule.compute_sleep_duration(None, now).is_none() {
                assert!(schedule.is_within_operating_hours(now), "hour {hour}");
            }
        }
    }
}
