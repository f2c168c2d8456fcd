use std::{thread, time::Duration};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::practicum::{ApiError, StatusSource};
use crate::response::{check_response, reported_timestamp, Checked, ResponseError};
use crate::telegram::Notifier;
use crate::utils::unix_timestamp;
use crate::verdict::{parse_status, StatusError};

/// Anything that can go wrong between fetching and formatting a status
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[error(transparent)]
    Status(#[from] StatusError),
}

impl CycleError {
    pub fn notification(&self) -> String {
        format!("Сбой в работе программы: {self}")
    }
}

pub trait Clock {
    /// Current Unix timestamp in seconds
    fn now(&self) -> i64;
    fn sleep(&self, period: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        unix_timestamp()
    }

    fn sleep(&self, period: Duration) {
        thread::sleep(period);
    }
}

/// How the lower bound of each query window is chosen
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorMode {
    /// `now - lookback` on every cycle
    #[default]
    Rolling,
    /// Start at `now - lookback`, then follow the API's `current_date`
    Advancing,
}

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub retry_period: Duration,
    pub lookback: Duration,
    pub cursor_mode: CursorMode,
}

impl PollSettings {
    fn lookback_secs(&self) -> i64 {
        i64::try_from(self.lookback.as_secs()).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A status message was delivered
    Notified,
    /// The query window held no homework
    NothingNew,
    /// A status message was built but could not be delivered
    DeliveryFailed,
    /// The cycle faulted; `reported` is true when the fault reached the chat
    Failed { reported: bool },
}

struct Polled {
    message: Option<String>,
    current_date: Option<i64>,
}

pub struct Poller<S, N, C> {
    source: S,
    notifier: N,
    clock: C,
    settings: PollSettings,
    cursor: i64,
    last_error: Option<String>,
}

impl<S: StatusSource, N: Notifier, C: Clock> Poller<S, N, C> {
    pub fn new(source: S, notifier: N, clock: C, settings: PollSettings) -> Self {
        let cursor = clock.now().saturating_sub(settings.lookback_secs());
        Poller {
            source,
            notifier,
            clock,
            settings,
            cursor,
            last_error: None,
        }
    }

    fn from_date(&self) -> i64 {
        match self.settings.cursor_mode {
            CursorMode::Rolling => self
                .clock
                .now()
                .saturating_sub(self.settings.lookback_secs()),
            CursorMode::Advancing => self.cursor,
        }
    }

    /// Runs cycles forever, or `max_cycles` times, sleeping after each one.
    pub fn run(&mut self, max_cycles: Option<usize>) {
        info!(
            "Polling every {}s with {:?} cursor",
            self.settings.retry_period.as_secs(),
            self.settings.cursor_mode
        );
        let mut completed = 0;
        while max_cycles.map_or(true, |max| completed < max) {
            let outcome = self.run_cycle();
            debug!("Cycle finished: {outcome:?}");
            completed += 1;
            // Sleep regardless of the cycle outcome
            self.clock.sleep(self.settings.retry_period);
        }
    }

    /// Runs a single fetch, validate, interpret and notify pass.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        match self.poll() {
            Ok(Polled {
                message,
                current_date,
            }) => {
                let outcome = match message {
                    Some(message) => self.deliver_status(&message),
                    None => {
                        debug!("No new homework statuses");
                        CycleOutcome::NothingNew
                    }
                };
                if outcome != CycleOutcome::DeliveryFailed {
                    self.advance_cursor(current_date);
                }
                outcome
            }
            Err(err) => CycleOutcome::Failed {
                reported: self.report_failure(&err),
            },
        }
    }

    fn poll(&self) -> Result<Polled, CycleError> {
        let response = self.source.fetch(self.from_date())?;
        debug!("API response: {response:#}");
        let message = match check_response(&response)? {
            Checked::Empty => None,
            Checked::Latest(homework) => Some(parse_status(homework)?),
        };
        Ok(Polled {
            message,
            current_date: reported_timestamp(&response),
        })
    }

    fn advance_cursor(&mut self, current_date: Option<i64>) {
        if self.settings.cursor_mode != CursorMode::Advancing {
            return;
        }
        match current_date {
            Some(current_date) => {
                debug!("Advancing cursor from {} to {current_date}", self.cursor);
                self.cursor = current_date;
            }
            None => warn!("Response carried no current_date, cursor stays at {}", self.cursor),
        }
    }

    fn deliver_status(&self, message: &str) -> CycleOutcome {
        info!("{message}");
        match self.notifier.deliver(message) {
            Ok(()) => CycleOutcome::Notified,
            Err(err) => {
                error!("Failed to deliver status notification: {err}");
                CycleOutcome::DeliveryFailed
            }
        }
    }

    /// Sends the fault to the chat unless it repeats the last one sent.
    fn report_failure(&mut self, err: &CycleError) -> bool {
        let message = err.notification();
        error!("{message}");
        if self.last_error.as_deref() == Some(message.as_str()) {
            debug!("Fault already reported, not notifying again");
            return false;
        }
        match self.notifier.deliver(&message) {
            Ok(()) => {
                self.last_error = Some(message);
                true
            }
            Err(delivery_err) => {
                error!("Failed to deliver fault notification: {delivery_err}");
                false
            }
        }
    }
}
