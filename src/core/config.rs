use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::env;
use std::str::FromStr;

use super::error::MonitorError;

pub const DEFAULT_BINANCE_FUTURES_URL: &str = "https://fapi.binance.com";

/// Upper bound for the cooldown and every configured sleep: one year.
pub const MAX_COOLDOWN_HOURS: u64 = 24 * 365;
pub const MAX_SLEEP_SECS: u64 = MAX_COOLDOWN_HOURS * 3600;

#[derive(Debug, Clone)]
pub struct Config {
    pub binance: BinanceConfig,
    pub notification: NotificationConfig,
    pub schedule: ScheduleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// `None` disables delivery; detections are still logged.
    pub webhook_url: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub poll_interval_secs: u64,
    pub timezone: Tz,
    pub operating_start_hour: u32,
    pub operating_end_hour: u32,
    pub alert_cooldown_hours: u64,
    pub max_scheduled_sleep_secs: u64,
    pub off_hours_recheck_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
    pub log_dir: String,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BINANCE_FUTURES_URL.to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 3300,
            timezone: chrono_tz::Asia::Shanghai,
            operating_start_hour: 14,
            operating_end_hour: 23,
            alert_cooldown_hours: 24,
            max_scheduled_sleep_secs: 3600,
            off_hours_recheck_secs: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let request_timeout_secs = parse_or(&lookup, "HTTP_TIMEOUT_SECS", 10u64)?;

        let defaults = ScheduleConfig::default();
        let timezone = match non_empty(&lookup, "MONITOR_TIMEZONE") {
            Some(name) => Tz::from_str(&name).map_err(|_| {
                MonitorError::Config(format!(
                    "MONITOR_TIMEZONE: {} (expected IANA tz like Asia/Shanghai)",
                    name
                ))
            })?,
            None => defaults.timezone,
        };

        let config = Config {
            binance: BinanceConfig {
                base_url: non_empty(&lookup, "BINANCE_FUTURES_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BINANCE_FUTURES_URL.to_string()),
                request_timeout_secs,
            },
            notification: NotificationConfig {
                webhook_url: non_empty(&lookup, "LARK_WEBHOOK_URL"),
                request_timeout_secs,
            },
            schedule: ScheduleConfig {
                poll_interval_secs: parse_or(
                    &lookup,
                    "POLL_INTERVAL_SECS",
                    defaults.poll_interval_secs,
                )?,
                timezone,
                operating_start_hour: parse_or(
                    &lookup,
                    "OPERATING_START_HOUR",
                    defaults.operating_start_hour,
                )?,
                operating_end_hour: parse_or(
                    &lookup,
                    "OPERATING_END_HOUR",
                    defaults.operating_end_hour,
                )?,
                alert_cooldown_hours: parse_or(
                    &lookup,
                    "ALERT_COOLDOWN_HOURS",
                    defaults.alert_cooldown_hours,
                )?,
                max_scheduled_sleep_secs: parse_or(
                    &lookup,
                    "MAX_SCHEDULED_SLEEP_SECS",
                    defaults.max_scheduled_sleep_secs,
                )?,
                off_hours_recheck_secs: parse_or(
                    &lookup,
                    "OFF_HOURS_RECHECK_SECS",
                    defaults.off_hours_recheck_secs,
                )?,
            },
            logging: LoggingConfig {
                log_level: non_empty(&lookup, "LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                log_dir: non_empty(&lookup, "LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            },
        };

        config.schedule.validate()?;
        Ok(config)
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.operating_end_hour > 24 || self.operating_start_hour >= self.operating_end_hour {
            return Err(MonitorError::Config(format!(
                "operating hours {}..{} must satisfy start < end <= 24",
                self.operating_start_hour, self.operating_end_hour
            )));
        }
        if !(1..=MAX_COOLDOWN_HOURS).contains(&self.alert_cooldown_hours) {
            return Err(MonitorError::Config(format!(
                "ALERT_COOLDOWN_HOURS must be between 1 and {}, got {}",
                MAX_COOLDOWN_HOURS, self.alert_cooldown_hours
            )));
        }
        for (key, secs) in [
            ("POLL_INTERVAL_SECS", self.poll_interval_secs),
            ("MAX_SCHEDULED_SLEEP_SECS", self.max_scheduled_sleep_secs),
            ("OFF_HOURS_RECHECK_SECS", self.off_hours_recheck_secs),
        ] {
            if !(1..=MAX_SLEEP_SECS).contains(&secs) {
                return Err(MonitorError::Config(format!(
                    "{} must be between 1 and {}, got {}",
                    key, MAX_SLEEP_SECS, secs
                )));
            }
        }
        Ok(())
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty(lookup, key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.binance.base_url, DEFAULT_BINANCE_FUTURES_URL);
        assert_eq!(config.binance.request_timeout_secs, 10);
        assert!(config.notification.webhook_url.is_none());
        assert_eq!(config.schedule.poll_interval_secs, 3300);
        assert_eq!(config.schedule.operating_start_hour, 14);
        assert_eq!(config.schedule.operating_end_hour, 23);
        assert_eq!(config.schedule.timezone, chrono_tz::Asia::Shanghai);
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("LARK_WEBHOOK_URL", "https://open.feishu.cn/open-apis/bot/v2/hook/abc"),
            ("POLL_INTERVAL_SECS", "60"),
            ("MONITOR_TIMEZONE", "Europe/London"),
            ("HTTP_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(
            config.notification.webhook_url.as_deref(),
            Some("https://open.feishu.cn/open-apis/bot/v2/hook/abc")
        );
        assert_eq!(config.schedule.poll_interval_secs, 60);
        assert_eq!(config.schedule.timezone, chrono_tz::Europe::London);
        assert_eq!(config.notification.request_timeout_secs, 3);
        assert_eq!(config.binance.request_timeout_secs, 3);
    }

    #[test]
    fn test_blank_webhook_disables_notifications() {
        let config = Config::from_lookup(lookup_from(&[("LARK_WEBHOOK_URL", "   ")])).unwrap();
        assert!(config.notification.webhook_url.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("POLL_INTERVAL_SECS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("MONITOR_TIMEZONE", "Mars/Base")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[
            ("OPERATING_START_HOUR", "23"),
            ("OPERATING_END_HOUR", "14"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup_from(&[("POLL_INTERVAL_SECS", "0")])).is_err());
    }

    #[test]
    fn test_cooldown_and_sleep_bounds() {
        for value in ["0", "8761", "3000000000000000"] {
            assert!(
                Config::from_lookup(lookup_from(&[("ALERT_COOLDOWN_HOURS", value)])).is_err(),
                "cooldown {value} accepted"
            );
        }
        assert!(Config::from_lookup(lookup_from(&[("ALERT_COOLDOWN_HOURS", "8760")])).is_ok());

        assert!(Config::from_lookup(lookup_from(&[(
            "MAX_SCHEDULED_SLEEP_SECS",
            "18446744073709551615"
        )]))
        .is_err());
        assert!(Config::from_lookup(lookup_from(&[("OFF_HOURS_RECHECK_SECS", "0")])).is_err());
    }
}
