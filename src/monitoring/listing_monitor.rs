use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;

use super::reporter::{format_symbol_list, ListingAlert};
use super::schedule::Schedule;
use super::state::{ContractSet, Detection, DetectionOutcome, MonitorState};
use crate::api::{ContractSource, Notifier};
use crate::core::{MonitorError, ScheduleConfig};

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// What one loop iteration does before sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Cooldown or operating-window rule; no poll this iteration.
    Wait(Duration),
    Poll,
}

/// Watches the exchange for newly listed perpetual contracts and alerts the
/// chat channel once per detection, then backs off for the cooldown.
pub struct ListingMonitor<S, N> {
    source: S,
    notifier: N,
    schedule: Schedule,
    clock: Clock,
}

impl<S, N> ListingMonitor<S, N>
where
    S: ContractSource,
    N: Notifier,
{
    pub fn new(source: S, notifier: N, config: ScheduleConfig) -> Self {
        Self {
            source,
            notifier,
            schedule: Schedule::new(config),
            clock: Box::new(Utc::now),
        }
    }

    /// Replaces the wall clock the run loop reads `now` from.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    /// Current perpetual contracts. An empty list is reported as a failed
    /// fetch: the exchange never legitimately delists everything at once.
    pub async fn fetch_contract_set(&self) -> Result<ContractSet, MonitorError> {
        let symbols = self.source.fetch_contract_set().await?;
        if symbols.is_empty() {
            return Err(MonitorError::EmptyContractList);
        }
        Ok(symbols)
    }

    pub async fn detect_new_symbols(
        &self,
        mut state: MonitorState,
        now: DateTime<Utc>,
    ) -> (MonitorState, Detection) {
        let current = match self.fetch_contract_set().await {
            Ok(symbols) => symbols,
            Err(e) => {
                tracing::error!("Failed to fetch Binance contract list: {}", e);
                return (state, Detection::quiet(DetectionOutcome::FetchFailed));
            }
        };

        let Some(previous) = state.last_symbols.as_ref() else {
            tracing::info!("Baseline established with {} perpetual contracts", current.len());
            state.last_symbols = Some(current);
            return (state, Detection::quiet(DetectionOutcome::BaselineEstablished));
        };

        let mut new_symbols: ContractSet = current.difference(previous).cloned().collect();
        new_symbols.extend(state.unalerted.intersection(&current).cloned());

        if new_symbols.is_empty() {
            tracing::debug!("No new contracts ({} listed)", current.len());
            state.unalerted.clear();
            state.last_symbols = Some(current);
            return (state, Detection::quiet(DetectionOutcome::NoChange));
        }

        tracing::info!(
            "Found {} new contracts: {}",
            new_symbols.len(),
            format_symbol_list(&new_symbols)
        );

        let message =
            ListingAlert::new(now, self.schedule.timezone(), new_symbols.clone()).to_message();

        let alert_sent = match self.notifier.send_text(&message).await {
            Ok(()) => {
                state.last_alert_time = Some(now);
                state.unalerted.clear();
                tracing::info!("Alert delivered, recorded alert time {}", now);
                true
            }
            Err(MonitorError::NotificationsDisabled) => {
                state.unalerted.clear();
                false
            }
            Err(e) => {
                tracing::error!("Failed to deliver listing alert: {}", e);
                state.unalerted = new_symbols.clone();
                false
            }
        };

        state.last_symbols = Some(current);
        (state, Detection::new_listings(new_symbols, alert_sent))
    }

    pub fn poll_interval(&self) -> Duration {
        self.schedule.poll_interval()
    }

    pub fn is_within_operating_hours(&self, now: DateTime<Utc>) -> bool {
        self.schedule.is_within_operating_hours(now)
    }

    pub fn should_pause_after_alert(&self, state: &MonitorState, now: DateTime<Utc>) -> bool {
        self.schedule
            .should_pause_after_alert(state.last_alert_time, now)
    }

    pub fn compute_sleep_duration(
        &self,
        state: &MonitorState,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        self.schedule
            .compute_sleep_duration(state.last_alert_time, now)
    }

    pub fn plan_iteration(&self, state: &MonitorState, now: DateTime<Utc>) -> LoopAction {
        if let Some(wait) = self.compute_sleep_duration(state, now) {
            return LoopAction::Wait(wait);
        }
        if !self.is_within_operating_hours(now) {
            return LoopAction::Wait(self.schedule.off_hours_recheck());
        }
        LoopAction::Poll
    }

    /// Hard pause after a delivered alert, the normal cadence otherwise.
    pub fn pause_after_poll(&self, detection: &Detection, interval: Duration) -> Duration {
        if detection.alert_sent {
            self.schedule.cooldown()
        } else {
            interval
        }
    }

    /// Runs until `shutdown` resolves and returns the final state. Errors
    /// inside an iteration never end the loop.
    pub async fn run<F>(&self, interval: Duration, shutdown: F) -> MonitorState
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut state = MonitorState::new();
        tracing::info!(
            "🔔 Monitoring Binance perpetual listings (interval {}s, window {:02}:00-{:02}:00 {})",
            interval.as_secs(),
            self.schedule.config().operating_start_hour,
            self.schedule.config().operating_end_hour,
            self.schedule.timezone()
        );

        loop {
            let now = (self.clock)();

            let pause = match self.plan_iteration(&state, now) {
                LoopAction::Wait(wait) => {
                    if self.should_pause_after_alert(&state, now) {
                        tracing::info!("Alert cooldown, sleeping {}s", wait.as_secs());
                    } else {
                        tracing::info!("Outside operating hours, sleeping {}s", wait.as_secs());
                    }
                    wait
                }
                LoopAction::Poll => {
                    let (next, detection) = self.detect_new_symbols(state, now).await;
                    state = next;

                    let pause = self.pause_after_poll(&detection, interval);
                    if detection.alert_sent {
                        tracing::info!(
                            "New contracts alerted, pausing checks for {}h",
                            pause.as_secs() / 3600
                        );
                    }
                    pause
                }
            };

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, listing monitor stopped");
                    break;
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }

        state
    }
}
