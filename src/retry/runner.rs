use std::fmt::Display;
use std::future::Future;

use tokio::time;
use tracing::debug;

use crate::{
    error::Transient,
    events::{Bus, Event, EventKind},
    policies::{RetryOn, RetryPolicy, RetrySettings},
};

/// Runs `op`, retrying throttle failures.
///
/// Without a policy, a fresh default fixed policy is used
/// (9 retries, 500ms apart, 5s budget).
pub async fn run_with_retry<T, E, F, Fut>(op: F, policy: Option<RetryPolicy>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    Retry::new(policy.unwrap_or_default(), RetryOn::Throttle)
        .run(op)
        .await
}

/// Runs `op`, retrying throttle failures and version conflicts.
///
/// Without a policy, a fresh default exponential policy is used
/// (10 retries, 100ms doubling, 30s budget).
pub async fn run_with_conflict_retry<T, E, F, Fut>(
    op: F,
    policy: Option<RetryPolicy>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let policy = policy
        .unwrap_or_else(|| RetryPolicy::exponential(RetrySettings::exponential_default()));
    Retry::new(policy, RetryOn::ThrottleOrConflict)
        .run(op)
        .await
}

/// Configurable retry runner.
///
/// ### Rules
/// - Attempts run **sequentially**; the same policy instance carries the attempt
///   counter and the delay across all of them.
/// - There is no cancellation: the loop ends on success, on a non-admitted error,
///   or when the policy denies another retry.
/// - Events are published only when a [`Bus`] is attached.
pub struct Retry<'a> {
    policy: RetryPolicy,
    on: RetryOn,
    label: &'static str,
    bus: Option<&'a Bus>,
}

impl<'a> Retry<'a> {
    pub fn new(policy: RetryPolicy, on: RetryOn) -> Self {
        Self {
            policy,
            on,
            label: "store",
            bus: None,
        }
    }

    /// Sets the operation label used in events and logs.
    #[must_use]
    pub fn labeled(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Publishes `RetryScheduled` / `RetriesExhausted` to `bus`.
    #[must_use]
    pub fn observed(mut self, bus: &'a Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// The policy state (attempts made, current delay).
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `op` until it succeeds, fails permanently, or the policy is spent.
    ///
    /// The original error of the last attempt is returned on failure.
    pub async fn run<T, E, F, Fut>(&mut self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !self.on.admits(&err) {
                return Err(err);
            }

            if !self.policy.should_retry() {
                debug!(
                    op = self.label,
                    attempts = self.policy.attempts_made(),
                    elapsed = ?self.policy.elapsed(),
                    error = %err,
                    "retry budget spent"
                );
                self.publish(
                    Event::new(EventKind::RetriesExhausted)
                        .with_attempt(self.policy.attempts_made())
                        .with_reason(err.to_string()),
                );
                return Err(err);
            }

            let delay = self.policy.sleep_delay();
            debug!(
                op = self.label,
                attempt = self.policy.attempts_made(),
                ?delay,
                error = %err,
                "retrying after transient failure"
            );
            self.publish(
                Event::new(EventKind::RetryScheduled)
                    .with_attempt(self.policy.attempts_made())
                    .with_delay(delay)
                    .with_reason(err.to_string()),
            );

            time::sleep(delay).await;
        }
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = self.bus {
            bus.publish(ev.with_op(self.label));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use crate::error::StoreError;
    use crate::model::{Entity, SessionId};
    use crate::policies::JitterPolicy;

    fn conflict() -> StoreError {
        StoreError::VersionConflict {
            entity: Entity::Session(SessionId::new()),
            expected: 1,
            found: 2,
        }
    }

    fn fixed(count: u32) -> RetryPolicy {
        RetryPolicy::fixed(RetrySettings::new(
            count,
            Duration::from_millis(50),
            Duration::from_secs(60),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_try_success_never_sleeps() {
        let start = time::Instant::now();
        let mut retry = Retry::new(fixed(5), RetryOn::Throttle);

        let v: Result<u32, StoreError> = retry.run(|| async { Ok(7) }).await;

        assert_eq!(v.unwrap(), 7);
        assert_eq!(retry.policy().attempts_made(), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_throttled_retries_exactly_max_count() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut retry = Retry::new(fixed(4), RetryOn::Throttle);
        let start = time::Instant::now();

        let c = calls.clone();
        let res: Result<(), StoreError> = retry
            .run(move || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Err(StoreError::throttled()) }
            })
            .await;

        assert_eq!(res.unwrap_err(), StoreError::throttled());
        // first attempt + 4 retries
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(retry.policy().attempts_made(), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_propagates_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let res: Result<(), StoreError> = run_with_retry(
            move || {
                c.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(StoreError::Backend {
                        code: Some(2),
                        message: "bad value".into(),
                    })
                }
            },
            None,
        )
        .await;

        assert!(matches!(res, Err(StoreError::Backend { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_is_not_retried_by_throttle_entry_point() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let res: Result<(), StoreError> = run_with_retry(
            move || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Err(conflict()) }
            },
            Some(fixed(3)),
        )
        .await;

        assert!(matches!(res, Err(StoreError::VersionConflict { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_entry_point_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let res: Result<&str, StoreError> = run_with_conflict_retry(
            move || {
                let n = c.fetch_add(1, Ordering::SeqCst);
                async move {
                    match n {
                        0 => Err(conflict()),
                        1 => Err(StoreError::throttled()),
                        _ => Ok("saved"),
                    }
                }
            },
            None,
        )
        .await;

        assert_eq!(res.unwrap(), "saved");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_sleeps_double() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let policy = RetryPolicy::exponential(RetrySettings::new(
            4,
            Duration::from_millis(100),
            Duration::from_secs(60),
        ));
        let mut retry = Retry::new(policy, RetryOn::ThrottleOrConflict)
            .labeled("session.touch")
            .observed(&bus);

        let res: Result<(), StoreError> = retry.run(|| async { Err(conflict()) }).await;
        assert!(res.is_err());

        let mut delays = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            assert_eq!(ev.op.as_deref(), Some("session.touch"));
            match ev.kind {
                EventKind::RetryScheduled => delays.push(ev.delay_ms.unwrap()),
                EventKind::RetriesExhausted => assert_eq!(ev.attempt, Some(4)),
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(delays, vec![100, 200, 400, 800]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jittered_sleeps_stay_within_nominal_delay() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let policy = RetryPolicy::exponential(RetrySettings::new(
            4,
            Duration::from_millis(100),
            Duration::from_secs(60),
        ))
        .with_jitter(JitterPolicy::Equal);
        let mut retry = Retry::new(policy, RetryOn::Throttle).observed(&bus);
        let start = time::Instant::now();

        let res: Result<(), StoreError> = retry.run(|| async { Err(StoreError::throttled()) }).await;
        assert!(res.is_err());

        let slept: Vec<u32> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|ev| ev.kind == EventKind::RetryScheduled)
            .filter_map(|ev| ev.delay_ms)
            .collect();
        let nominal = [100u32, 200, 400, 800];
        assert_eq!(slept.len(), nominal.len());
        for (got, full) in slept.iter().zip(nominal) {
            assert!(*got >= full / 2 && *got <= full, "{got}ms outside [{}, {full}]", full / 2);
        }
        // Jitter never feeds back into the progression.
        assert_eq!(retry.policy().retry_delay(), Duration::from_millis(800));
        assert_eq!(
            start.elapsed(),
            Duration::from_millis(slept.iter().map(|&ms| u64::from(ms)).sum())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_budget_stops_slow_operation() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::fixed(RetrySettings::new(
            100,
            Duration::from_millis(100),
            Duration::from_secs(1),
        ));

        let c = calls.clone();
        let res: Result<(), StoreError> = run_with_retry(
            move || {
                c.fetch_add(1, Ordering::SeqCst);
                async {
                    time::sleep(Duration::from_millis(400)).await;
                    Err(StoreError::throttled())
                }
            },
            Some(policy),
        )
        .await;

        assert!(res.is_err());
        // t=0.4 retry, t=0.9 retry, t=1.4 over budget
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
