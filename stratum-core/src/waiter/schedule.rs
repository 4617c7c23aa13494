//! Delay between successive refreshes

use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};

/// First delay of the exponential schedule
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
/// Cap of the exponential schedule
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Yields the sleep before each refresh after the first.
///
/// A non-zero poll interval gives a fixed schedule; otherwise delays grow
/// exponentially from 100ms to 10s. Every delay is floored by `min_timeout`.
pub(crate) struct DelaySchedule {
    fixed: Option<Duration>,
    floor: Duration,
    backoff: ExponentialBackoff,
}

impl DelaySchedule {
    pub(crate) fn new(poll_interval: Duration, min_timeout: Duration) -> Self {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(INITIAL_BACKOFF)
            .with_max_delay(MAX_BACKOFF)
            .with_factor(2.0)
            .with_max_times(usize::MAX)
            .build();

        Self {
            fixed: (!poll_interval.is_zero()).then_some(poll_interval),
            floor: min_timeout,
            backoff,
        }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = match self.fixed {
            Some(interval) => interval,
            None => self.backoff.next().unwrap_or(MAX_BACKOFF),
        };
        delay.max(self.floor)
    }
}
