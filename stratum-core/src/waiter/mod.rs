//! Waiter - Polling a remote object until it reaches a terminal state
//!
//! Most control-plane operations are asynchronous: the API call returns
//! immediately and the object moves through service-specific statuses
//! (`SUBMITTED`, `TRAINING`, `TRAINED`, ...). A [`StateChangeConf`] describes
//! which statuses mean "keep waiting", "done" and "failed", and
//! [`StateChangeConf::wait_for_state`] drives a [`Refresh`] capability until one
//! of those outcomes, the timeout, or cancellation.
//!
//! # Example
//!
//! ```ignore
//! let model = StateChangeConf::new(format!("entity recognizer {}", arn))
//!     .pending(["SUBMITTED", "TRAINING"])
//!     .target(["TRAINED"])
//!     .failure(["IN_ERROR"])
//!     .poll_interval(Duration::from_secs(60))
//!     .timeout(timeouts.create)
//!     .wait_for_state(&cancel, || describe(arn))
//!     .await?;
//! ```

mod error;
mod schedule;

pub use error::{BoxError, FetchError, WaitError, WaitFailure};

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use schedule::DelaySchedule;

/// Consecutive not-found refreshes tolerated by default
pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

/// Default total wait budget
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// One successful refresh: the object snapshot and its status label
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<T> {
    pub snapshot: T,
    pub status: String,
    /// Remote-reported diagnostic (status message, failure reason)
    pub detail: Option<String>,
}

impl<T> Observation<T> {
    pub fn new(snapshot: T, status: impl Into<String>) -> Self {
        Self {
            snapshot,
            status: status.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Option<impl Into<String>>) -> Self {
        self.detail = detail.map(Into::into);
        self
    }
}

pub type RefreshResult<T> = Result<Observation<T>, FetchError>;

/// Capability that reads the current state of one remote object
///
/// Implemented for any `FnMut() -> impl Future<Output = RefreshResult<T>>`, so
/// resources usually pass a closure around their describe call.
pub trait Refresh<T> {
    fn refresh(&mut self) -> impl Future<Output = RefreshResult<T>> + Send;
}

impl<T, F, Fut> Refresh<T> for F
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RefreshResult<T>> + Send,
{
    fn refresh(&mut self) -> impl Future<Output = RefreshResult<T>> + Send {
        self()
    }
}

/// Description of one wait operation
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    resource: String,
    pending: Vec<String>,
    target: Vec<String>,
    failure: Vec<String>,
    delay: Duration,
    poll_interval: Duration,
    min_timeout: Duration,
    timeout: Duration,
    not_found_checks: u32,
    continuous_target_occurrence: u32,
    target_absent: bool,
    strict_states: bool,
}

impl StateChangeConf {
    /// Create a configuration; `resource` labels every error and log line
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            pending: Vec::new(),
            target: Vec::new(),
            failure: Vec::new(),
            delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
            min_timeout: Duration::ZERO,
            timeout: DEFAULT_TIMEOUT,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            continuous_target_occurrence: 1,
            target_absent: false,
            strict_states: false,
        }
    }

    pub fn pending<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending = statuses.into_iter().map(Into::into).collect();
        self
    }

    pub fn target<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = statuses.into_iter().map(Into::into).collect();
        self
    }

    pub fn failure<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Wait before the first refresh
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fixed sleep between refreshes; zero selects exponential backoff
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Floor on every sleep between refreshes
    pub fn min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Consecutive not-found refreshes to tolerate before absence is terminal
    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    /// Consecutive target observations required before success
    pub fn continuous_target_occurrence(mut self, occurrences: u32) -> Self {
        self.continuous_target_occurrence = occurrences.max(1);
        self
    }

    /// Treat absence of the object as the goal (deletion waiters)
    pub fn target_absent(mut self) -> Self {
        self.target_absent = true;
        self
    }

    /// Reject statuses outside the pending/target/failure sets
    pub fn strict_states(mut self, strict: bool) -> Self {
        self.strict_states = strict;
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout
    }

    /// Check the configuration before any refresh is issued
    pub fn validate(&self) -> Result<(), WaitError> {
        if self.timeout.is_zero() {
            return Err(WaitError::InvalidConfig(format!(
                "{}: timeout must be greater than zero",
                self.resource
            )));
        }

        let sets = [
            ("pending", &self.pending),
            ("target", &self.target),
            ("failure", &self.failure),
        ];
        for (i, (left_name, left)) in sets.iter().enumerate() {
            for (right_name, right) in &sets[i + 1..] {
                if let Some(status) = left.iter().find(|s| right.contains(s)) {
                    return Err(WaitError::InvalidConfig(format!(
                        "{}: status '{}' is both {} and {}",
                        self.resource, status, left_name, right_name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Whether a not-found result that exhausted the budget counts as success
    fn absence_is_target(&self) -> bool {
        self.target_absent || self.target.is_empty()
    }

    fn expected(&self) -> String {
        if self.target.is_empty() {
            "absent".to_string()
        } else {
            self.target.join(", ")
        }
    }

    /// Refresh until a target status, a failure status, the timeout or
    /// cancellation.
    ///
    /// Returns `Ok(Some(snapshot))` when a target status is reached and
    /// `Ok(None)` when the awaited outcome is absence and the object is gone.
    /// Every error carries the last snapshot observed before the wait ended.
    pub async fn wait_for_state<T, R>(
        &self,
        cancel: &CancellationToken,
        mut refresh: R,
    ) -> Result<Option<T>, WaitFailure<T>>
    where
        R: Refresh<T>,
    {
        self.validate()
            .map_err(|e| WaitFailure::<T>::new(e, None))?;

        let deadline = Instant::now()
            .checked_add(self.timeout)
            .unwrap_or_else(far_future);
        let mut schedule = DelaySchedule::new(self.poll_interval, self.min_timeout);
        let mut progress = Progress::<T>::new();

        if !self.delay.is_zero() {
            debug!("{}: waiting {:?} before first refresh", self.resource, self.delay);
            self.pause(self.delay, deadline, cancel, &mut progress).await?;
        }

        loop {
            // No refresh once the wait is cancelled or expired
            if cancel.is_cancelled() {
                return Err(self.cancelled(&mut progress));
            }
            if Instant::now() >= deadline {
                return Err(self.timed_out(&mut progress));
            }
            progress.attempts += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(&mut progress)),
                _ = tokio::time::sleep_until(deadline) => return Err(self.timed_out(&mut progress)),
                result = async { refresh.refresh().await } => result,
            };

            match result {
                Ok(observation) => {
                    progress.not_found = 0;
                    let Observation {
                        snapshot,
                        status,
                        detail,
                    } = observation;

                    if self.failure.contains(&status) {
                        warn!("{}: entered failure state {}", self.resource, status);
                        let error = WaitError::Failed {
                            resource: self.resource.clone(),
                            status,
                            detail,
                        };
                        return Err(WaitFailure::new(error, Some(snapshot)));
                    }

                    if self.target.contains(&status) {
                        progress.target_seen += 1;
                        if progress.target_seen >= self.continuous_target_occurrence {
                            debug!(
                                "{}: reached {} after {} attempts",
                                self.resource, status, progress.attempts
                            );
                            return Ok(Some(snapshot));
                        }
                    } else {
                        progress.target_seen = 0;
                        if self.strict_states && !self.pending.contains(&status) {
                            let error = WaitError::UnexpectedState {
                                resource: self.resource.clone(),
                                status,
                                expected: self.target.clone(),
                            };
                            return Err(WaitFailure::new(error, Some(snapshot)));
                        }
                    }

                    debug!(
                        "{}: state {} (attempt {})",
                        self.resource, status, progress.attempts
                    );
                    progress.last_status = Some(status);
                    progress.last_detail = detail;
                    progress.last_snapshot = Some(snapshot);
                }
                Err(FetchError::NotFound(message)) => {
                    progress.not_found += 1;
                    progress.target_seen = 0;

                    if progress.not_found > self.not_found_checks {
                        if self.absence_is_target() {
                            debug!("{}: no longer exists", self.resource);
                            return Ok(None);
                        }
                        let error = WaitError::NotFound {
                            resource: self.resource.clone(),
                            checks: self.not_found_checks,
                            last_error: message,
                        };
                        return Err(progress.fail(error));
                    }

                    debug!(
                        "{}: not found ({}/{}), retrying",
                        self.resource, progress.not_found, self.not_found_checks
                    );
                }
                Err(FetchError::Other(source)) => {
                    warn!("{}: refresh failed: {}", self.resource, source);
                    let error = WaitError::Fetch {
                        resource: self.resource.clone(),
                        source,
                    };
                    return Err(progress.fail(error));
                }
            }

            let wait = schedule.next_delay();
            self.pause(wait, deadline, cancel, &mut progress).await?;
        }
    }

    /// Sleep for `wait`, cut short by the deadline or cancellation
    async fn pause<T>(
        &self,
        wait: Duration,
        deadline: Instant,
        cancel: &CancellationToken,
        progress: &mut Progress<T>,
    ) -> Result<(), WaitFailure<T>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(self.cancelled(progress)),
            _ = tokio::time::sleep_until(deadline) => Err(self.timed_out(progress)),
            _ = tokio::time::sleep(wait) => Ok(()),
        }
    }

    fn cancelled<T>(&self, progress: &mut Progress<T>) -> WaitFailure<T> {
        debug!("{}: wait cancelled", self.resource);
        let error = WaitError::Cancelled {
            resource: self.resource.clone(),
            last_status: progress.last_status.clone(),
        };
        progress.fail(error)
    }

    fn timed_out<T>(&self, progress: &mut Progress<T>) -> WaitFailure<T> {
        warn!(
            "{}: timed out after {:?} ({} attempts)",
            self.resource, self.timeout, progress.attempts
        );
        let error = WaitError::Timeout {
            resource: self.resource.clone(),
            timeout: self.timeout,
            expected: self.expected(),
            last_status: progress.last_status.clone(),
            last_detail: progress.last_detail.clone(),
            attempts: progress.attempts,
        };
        progress.fail(error)
    }
}

/// Deadline used when `now + timeout` is not representable
fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86400 * 365 * 30)
}

/// Counters local to one `wait_for_state` call
#[derive(Debug)]
struct Progress<T> {
    attempts: u32,
    not_found: u32,
    target_seen: u32,
    last_status: Option<String>,
    last_detail: Option<String>,
    last_snapshot: Option<T>,
}

impl<T> Progress<T> {
    fn new() -> Self {
        Self {
            attempts: 0,
            not_found: 0,
            target_seen: 0,
            last_status: None,
            last_detail: None,
            last_snapshot: None,
        }
    }

    fn fail(&mut self, error: WaitError) -> WaitFailure<T> {
        WaitFailure::new(error, self.last_snapshot.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Refresh that replays a script, then repeats its last entry
    #[derive(Clone)]
    struct Script {
        steps: Arc<Mutex<VecDeque<Step>>>,
        calls: Arc<Mutex<u32>>,
    }

    #[derive(Clone)]
    enum Step {
        Status(&'static str),
        NotFound,
        Error(&'static str),
    }

    impl Script {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: Arc::new(Mutex::new(steps.into())),
                calls: Arc::new(Mutex::new(0)),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }

        fn refresh(&self) -> impl FnMut() -> std::future::Ready<RefreshResult<u32>> + '_ {
            move || {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                let call = *calls;
                let mut steps = self.steps.lock().unwrap();
                let step = if steps.len() > 1 {
                    steps.pop_front().unwrap()
                } else {
                    steps.front().cloned().unwrap()
                };
                std::future::ready(match step {
                    Step::Status(status) => {
                        Ok(Observation::new(call, status).with_detail(Some(format!("call {}", call))))
                    }
                    Step::NotFound => Err(FetchError::not_found("no such model")),
                    Step::Error(message) => Err(FetchError::other(message)),
                })
            }
        }
    }

    fn training_conf() -> StateChangeConf {
        StateChangeConf::new("entity recognizer test")
            .pending(["SUBMITTED", "TRAINING"])
            .target(["TRAINED"])
            .failure(["IN_ERROR"])
            .poll_interval(Duration::from_secs(1))
            .timeout(Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_target_returns_without_sleeping() {
        let script = Script::new(vec![Step::Status("TRAINED")]);
        let start = Instant::now();

        let result = training_conf()
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap();

        assert_eq!(result, Some(1));
        assert_eq!(script.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_training_sequence_returns_third_snapshot() {
        let script = Script::new(vec![
            Step::Status("TRAINING"),
            Step::Status("TRAINING"),
            Step::Status("TRAINED"),
        ]);
        let start = Instant::now();

        let result = training_conf()
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap();

        assert_eq!(result, Some(3));
        assert_eq!(script.calls(), 3);
        // Two sleeps of one poll interval each
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_pending_times_out_at_deadline() {
        let script = Script::new(vec![Step::Status("TRAINING")]);
        let start = Instant::now();

        let failure = training_conf()
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap_err();

        // Snapshots are the call number, so this is the object of the 10th refresh
        assert_eq!(failure.last_snapshot, Some(10));
        let err = failure.error;
        assert!(err.is_timeout(), "unexpected error: {}", err);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(script.calls(), 10);
        assert_eq!(err.last_status(), Some("TRAINING"));
        match err {
            WaitError::Timeout {
                attempts,
                last_detail,
                ..
            } => {
                assert_eq!(attempts, 10);
                assert_eq!(last_detail.as_deref(), Some("call 10"));
            }
            other => panic!("Expected Timeout error, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_on_nth_call_stops_after_n_fetches() {
        let script = Script::new(vec![
            Step::Status("SUBMITTED"),
            Step::Status("TRAINING"),
            Step::Status("IN_ERROR"),
            Step::Status("TRAINED"),
        ]);

        let err = training_conf()
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap_err()
            .error;

        assert_eq!(script.calls(), 3);
        match err {
            WaitError::Failed { status, detail, .. } => {
                assert_eq!(status, "IN_ERROR");
                assert_eq!(detail.as_deref(), Some("call 3"));
            }
            other => panic!("Expected Failed error, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_within_budget_then_target_succeeds() {
        let script = Script::new(vec![Step::NotFound, Step::NotFound, Step::Status("TRAINED")]);

        let result = training_conf()
            .not_found_checks(2)
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap();

        assert_eq!(result, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_beyond_budget_fails() {
        let script = Script::new(vec![
            Step::NotFound,
            Step::NotFound,
            Step::NotFound,
            Step::Status("TRAINED"),
        ]);

        let err = training_conf()
            .not_found_checks(2)
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap_err()
            .error;

        assert!(err.is_not_found(), "unexpected error: {}", err);
        assert_eq!(script.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_success_when_absence_is_target() {
        let script = Script::new(vec![Step::Status("DELETING"), Step::NotFound]);

        let result = StateChangeConf::new("entity recognizer test")
            .pending(["DELETING"])
            .target_absent()
            .not_found_checks(0)
            .poll_interval(Duration::from_secs(1))
            .timeout(Duration::from_secs(10))
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(script.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_counter_resets_after_observation() {
        let script = Script::new(vec![
            Step::NotFound,
            Step::Status("SUBMITTED"),
            Step::NotFound,
            Step::Status("TRAINED"),
        ]);

        let result = training_conf()
            .not_found_checks(1)
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap();

        assert_eq!(result, Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_fetch_error_is_not_retried() {
        let script = Script::new(vec![Step::Status("TRAINING"), Step::Error("access denied")]);

        let err = training_conf()
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap_err()
            .error;

        assert!(matches!(err, WaitError::Fetch { .. }));
        assert_eq!(err.to_string(), "entity recognizer test: access denied");
        assert_eq!(script.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_returns_within_one_poll_interval() {
        let script = Script::new(vec![Step::Status("TRAINING")]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });
        let start = Instant::now();

        let err = training_conf()
            .timeout(Duration::from_secs(600))
            .wait_for_state(&cancel, script.refresh())
            .await
            .unwrap_err()
            .error;

        assert!(err.is_cancelled(), "unexpected error: {}", err);
        assert!(!err.is_timeout());
        assert!(start.elapsed() <= Duration::from_millis(3500));
        assert_eq!(err.last_status(), Some("TRAINING"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_token_stops_before_fetch() {
        let script = Script::new(vec![Step::Status("TRAINED")]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = training_conf()
            .wait_for_state(&cancel, script.refresh())
            .await
            .unwrap_err()
            .error;

        assert!(err.is_cancelled());
        assert_eq!(script.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_delay_skips_fetch() {
        let script = Script::new(vec![Step::Status("TRAINED")]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let failure = training_conf()
            .delay(Duration::from_secs(5))
            .wait_for_state(&cancel, script.refresh())
            .await
            .unwrap_err();

        assert!(failure.error.is_cancelled());
        assert_eq!(failure.last_snapshot, None);
        assert_eq!(script.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_fetch_once_deadline_has_passed() {
        let script = Script::new(vec![Step::Status("TRAINING")]);

        // The first sleep ends exactly at the deadline
        let err = training_conf()
            .poll_interval(Duration::from_secs(10))
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap_err()
            .error;

        assert!(err.is_timeout());
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeout_does_not_overflow() {
        let script = Script::new(vec![Step::Status("TRAINING"), Step::Status("TRAINED")]);

        let result = training_conf()
            .timeout(Duration::MAX)
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap();

        assert_eq!(result, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_carries_failing_snapshot() {
        let script = Script::new(vec![Step::Status("TRAINING"), Step::Status("IN_ERROR")]);

        let failure = training_conf()
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap_err();

        assert!(failure.error.is_failed());
        assert_eq!(failure.last_snapshot, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_precedes_first_fetch() {
        let script = Script::new(vec![Step::Status("TRAINED")]);
        let start = Instant::now();

        training_conf()
            .delay(Duration::from_secs(3))
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_min_timeout_floors_poll_interval() {
        let script = Script::new(vec![Step::Status("TRAINING"), Step::Status("TRAINED")]);
        let start = Instant::now();

        training_conf()
            .min_timeout(Duration::from_secs(4))
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuous_target_occurrence_requires_consecutive_targets() {
        let script = Script::new(vec![
            Step::Status("TRAINED"),
            Step::Status("TRAINING"),
            Step::Status("TRAINED"),
            Step::Status("TRAINED"),
        ]);

        let result = training_conf()
            .continuous_target_occurrence(2)
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap();

        assert_eq!(result, Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_is_pending_by_default() {
        let script = Script::new(vec![Step::Status("QUEUED"), Step::Status("TRAINED")]);

        let result = training_conf()
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap();

        assert_eq!(result, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_fails_in_strict_mode() {
        let script = Script::new(vec![Step::Status("QUEUED")]);

        let err = training_conf()
            .strict_states(true)
            .wait_for_state(&CancellationToken::new(), script.refresh())
            .await
            .unwrap_err()
            .error;

        match err {
            WaitError::UnexpectedState {
                status, expected, ..
            } => {
                assert_eq!(status, "QUEUED");
                assert_eq!(expected, vec!["TRAINED".to_string()]);
            }
            other => panic!("Expected UnexpectedState error, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_fetch_is_cut_off_by_deadline() {
        let start = Instant::now();

        let err = training_conf()
            .wait_for_state::<u32, _>(&CancellationToken::new(), || {
                std::future::pending::<RefreshResult<u32>>()
            })
            .await
            .unwrap_err()
            .error;

        assert!(err.is_timeout());
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn test_overlapping_statuses_are_rejected() {
        let err = StateChangeConf::new("model")
            .pending(["TRAINING"])
            .target(["TRAINED"])
            .failure(["TRAINING"])
            .validate()
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid wait configuration: model: status 'TRAINING' is both pending and failure"
        );
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = StateChangeConf::new("model")
            .target(["TRAINED"])
            .timeout(Duration::ZERO)
            .validate()
            .unwrap_err();

        assert!(matches!(err, WaitError::InvalidConfig(_)));
    }
}
