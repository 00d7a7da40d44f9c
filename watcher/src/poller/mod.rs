//! Homework status poller.
//!
//! One cycle is fetch → validate → extract → notify. The cursor only moves
//! after a status message actually reached the chat, so a failed delivery
//! replays the same window on the next cycle. Any cycle failure is turned
//! into a diagnostic and sent through the same de-duplicated path. Nothing
//! inside the loop is fatal.

use chrono::Utc;
use common::notify::Notifier;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::adapters::StatusApi;
use crate::error::PollError;
use crate::homework::{check_response, current_date, parse_status};

pub mod delivery;

use delivery::{deliver, Delivery, LastSent};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    /// Fixed pause between cycles.
    pub interval: Duration,
    /// How far before process start the first query window reaches.
    pub initial_lookback: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            initial_lookback: Duration::ZERO,
        }
    }
}

/// What a successful cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    NoNewStatuses,
    Status(Delivery),
}

pub struct Poller {
    api: Arc<dyn StatusApi>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    cursor: i64,
    last_status: LastSent,
    last_error: LastSent,
}

impl Poller {
    pub fn new(
        api: Arc<dyn StatusApi>,
        notifier: Arc<dyn Notifier>,
        settings: PollerSettings,
    ) -> Self {
        let lookback = i64::try_from(settings.initial_lookback.as_secs()).unwrap_or(i64::MAX);
        let cursor = Utc::now().timestamp().saturating_sub(lookback).max(0);
        Self {
            api,
            notifier,
            interval: settings.interval,
            cursor,
            last_status: LastSent::default(),
            last_error: LastSent::default(),
        }
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn last_status(&self) -> Option<&str> {
        self.last_status.get()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.get()
    }

    /// Fetch, validate, extract and notify once. Errors are returned, not sent.
    pub async fn poll_once(&mut self) -> Result<CycleOutcome, PollError> {
        let response = self.api.fetch(self.cursor).await?;
        let homeworks = check_response(&response)?;

        let Some(latest) = homeworks.first() else {
            debug!(from_date = self.cursor, "Отсутствуют новые статусы");
            return Ok(CycleOutcome::NoNewStatuses);
        };
        let message = parse_status(latest)?;

        let delivery = deliver(self.notifier.as_ref(), &mut self.last_status, &message).await;
        if delivery == Delivery::Sent {
            match current_date(&response) {
                Some(date) => self.cursor = date,
                None => warn!(from_date = self.cursor, "current_date missing or invalid, cursor kept"),
            }
        }
        Ok(CycleOutcome::Status(delivery))
    }

    /// One full cycle: failures become a de-duplicated diagnostic message.
    pub async fn run_cycle(&mut self) {
        match self.poll_once().await {
            Ok(outcome) => debug!(?outcome, cursor = self.cursor, "Cycle complete"),
            Err(e) => {
                let diagnostic = e.diagnostic();
                error!("{}", diagnostic);
                deliver(self.notifier.as_ref(), &mut self.last_error, &diagnostic).await;
            }
        }
    }

    /// Run cycles until `shutdown` flips to `true`.
    ///
    /// The flag is checked before each cycle and during the pause; a fetch
    /// already in flight is allowed to finish.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            from_date = self.cursor,
            "Homework poller starting"
        );
        loop {
            if *shutdown.borrow() {
                break;
            }
            self.run_cycle().await;
            if self.pause(&mut shutdown).await {
                break;
            }
        }
        info!(
            cursor = self.cursor,
            last_status = ?self.last_status(),
            last_error = ?self.last_error(),
            "Homework poller stopped"
        );
    }

    /// Sleep for the interval. Returns `true` if shutdown was requested.
    async fn pause(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let sleep = time::sleep(self.interval);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return false,
                changed = shutdown.changed() => match changed {
                    Ok(()) if *shutdown.borrow() => return true,
                    Ok(()) => continue,
                    Err(_) => {
                        // sender gone, nobody can stop us any more
                        (&mut sleep).await;
                        return false;
                    }
                },
            }
        }
    }
}
