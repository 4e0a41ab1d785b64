//! The batched, rate-limited, retrying fan-out controller.
//!
//! One controller run applies a single [`Operation`] to a set of target
//! addresses: targets are partitioned into small sequential batches, the
//! targets within a batch run concurrently under a global in-flight cap,
//! each attempt is individually time-boxed, and only timed-out attempts
//! are retried. One target's failure never disturbs another's processing;
//! the run always produces exactly one [`TargetResult`] per input target,
//! in input order.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, warn};
use tokio::sync::{Mutex, Semaphore};
use tokio::time::timeout;

use crate::client::{Connect, DeviceClient};
use crate::config::FanoutConfig;
use crate::errors::Error;
use crate::operation::Operation;
use crate::result::{FanoutResult, SuccessPolicy, TargetResult};
use crate::status::DeviceState;

/// Outcome of a single time-boxed attempt against a single target.
///
/// Timeouts are the only retryable class: transient congestion shows up as
/// a missed deadline, while connection and protocol errors are assumed
/// persistent and terminal.
enum Attempt {
    Done(DeviceState),
    TimedOut,
    Failed(Error),
}

/// Connections opened during one run, keyed by target. Owned by the run
/// and drained (with every client closed) before the run returns.
type ConnectionCache<C> = Mutex<HashMap<Ipv4Addr, Arc<C>>>;

/// Applies one operation to many bulbs with bounded concurrency, batching,
/// per-attempt timeouts, and timeout-only retries.
///
/// # Examples
///
/// ```ignore
/// use wiz_fanout::{FanoutController, Operation, SuccessPolicy, WizConnector};
///
/// let controller = FanoutController::new(WizConnector);
/// let result = controller
///     .run(&targets, &Operation::TurnOff, SuccessPolicy::All)
///     .await;
/// println!("{}/{} bulbs turned off", result.success_count, result.total_count);
/// ```
#[derive(Debug)]
pub struct FanoutController<C> {
    connector: C,
    config: FanoutConfig,
}

impl<C: Connect> FanoutController<C> {
    /// Create a controller with the default [`FanoutConfig`].
    pub fn new(connector: C) -> Self {
        Self::with_config(connector, FanoutConfig::default())
    }

    pub fn with_config(connector: C, config: FanoutConfig) -> Self {
        FanoutController { connector, config }
    }

    pub fn config(&self) -> &FanoutConfig {
        &self.config
    }

    /// Execute `op` against every address in `targets`.
    ///
    /// Guarantees:
    /// - an empty `targets` returns immediately with no device I/O;
    /// - `results` holds exactly `targets.len()` entries, in input order;
    /// - batches run sequentially, targets within a batch concurrently,
    ///   and never more than `max_concurrent` operations are in flight;
    /// - a target's client is created at most once per run and every
    ///   cached client is closed before this method returns, on every
    ///   path, with close failures logged and discarded.
    pub async fn run(
        &self,
        targets: &[Ipv4Addr],
        op: &Operation,
        policy: SuccessPolicy,
    ) -> FanoutResult {
        if targets.is_empty() {
            return FanoutResult::empty();
        }

        let limiter = Semaphore::new(self.config.max_concurrent.max(1));
        let cache: ConnectionCache<C::Client> = Mutex::new(HashMap::new());

        let mut results = Vec::with_capacity(targets.len());
        for batch in targets.chunks(self.config.batch_size.max(1)) {
            let tasks = batch
                .iter()
                .map(|&ip| self.drive_target(ip, op, &limiter, &cache));
            results.extend(join_all(tasks).await);
        }

        let mut cache = cache.into_inner();
        for (ip, client) in cache.drain() {
            if let Err(err) = client.close().await {
                warn!("error closing client for {ip}: {err}");
            }
        }

        FanoutResult::aggregate(results, policy)
    }

    /// Take one target from pending to a terminal result.
    ///
    /// Holds a limiter permit for the whole of the target's processing,
    /// retries included, so retries cannot push the run over the global
    /// in-flight cap.
    async fn drive_target(
        &self,
        ip: Ipv4Addr,
        op: &Operation,
        limiter: &Semaphore,
        cache: &ConnectionCache<C::Client>,
    ) -> TargetResult {
        let _permit = match limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => return TargetResult::failure(ip, 0, "concurrency limiter closed".into()),
        };

        let client = match self.cached_client(ip, cache).await {
            Ok(client) => client,
            Err(err) => return TargetResult::failure(ip, 1, err.to_string()),
        };

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match self.attempt(client.as_ref(), op).await {
                Attempt::Done(state) => {
                    return TargetResult::ok(ip, attempts, state, format!("{op} succeeded"));
                }
                Attempt::Failed(err) => {
                    return TargetResult::failure(ip, attempts, err.to_string());
                }
                Attempt::TimedOut if attempts <= self.config.max_retries => {
                    debug!("attempt {attempts} against {ip} timed out; retrying");
                }
                Attempt::TimedOut => {
                    return TargetResult::failure(
                        ip,
                        attempts,
                        format!("operation timed out after {attempts} attempts"),
                    );
                }
            }
        }
    }

    /// One attempt with the configured deadline. Exceeding the deadline
    /// cancels only this attempt; the cached client stays usable for a
    /// retry.
    async fn attempt(&self, client: &C::Client, op: &Operation) -> Attempt {
        match timeout(self.config.attempt_timeout, op.apply(client)).await {
            Ok(Ok(state)) => Attempt::Done(state),
            Ok(Err(err)) => Attempt::Failed(err),
            Err(_) => Attempt::TimedOut,
        }
    }

    /// Fetch the target's cached client, connecting on first use.
    ///
    /// The cache lock is not held across the connect so one slow target
    /// cannot stall another's cache access. Targets are unique within a
    /// run, so each entry is only ever touched by its own task.
    async fn cached_client(
        &self,
        ip: Ipv4Addr,
        cache: &ConnectionCache<C::Client>,
    ) -> Result<Arc<C::Client>, Error> {
        if let Some(client) = cache.lock().await.get(&ip) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(self.connector.connect(ip).await?);
        Ok(Arc::clone(
            cache
                .lock()
                .await
                .entry(ip)
                .or_insert_with(|| Arc::clone(&client)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::future::pending;
    use std::io;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::payload::Payload;
    use crate::types::{Color, PowerMode, White};

    #[derive(Debug, Clone, Copy)]
    enum Behavior {
        /// Complete immediately.
        Succeed,
        /// Complete after the given delay.
        SucceedAfter(Duration),
        /// Refuse the initial connection.
        RefuseConnect,
        /// Fail every attempt with a non-timeout device error.
        FailAttempt(&'static str),
        /// Hang (and get timed out) for the first `n` attempts, then
        /// complete.
        TimeoutTimes(u32),
        /// Hang on every attempt.
        AlwaysTimeout,
    }

    #[derive(Default)]
    struct Shared {
        connects: AtomicUsize,
        closes: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        events: StdMutex<Vec<(char, Ipv4Addr)>>,
    }

    /// Decrements the in-flight gauge even when the attempt future is
    /// dropped by a timeout.
    struct ActiveGuard<'a>(&'a Shared);

    impl Drop for ActiveGuard<'_> {
        fn drop(&mut self) {
            self.0.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    struct MockClient {
        ip: Ipv4Addr,
        behavior: Behavior,
        attempts: AtomicU32,
        shared: Arc<Shared>,
    }

    impl MockClient {
        fn state() -> DeviceState {
            DeviceState::from(&Payload::from(&PowerMode::On))
        }

        async fn perform(&self) -> Result<DeviceState, Error> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let active = self.shared.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.shared.max_active.fetch_max(active, Ordering::SeqCst);
            let _guard = ActiveGuard(&self.shared);
            self.shared.events.lock().unwrap().push(('s', self.ip));

            let result = match self.behavior {
                Behavior::Succeed | Behavior::RefuseConnect => Ok(Self::state()),
                Behavior::SucceedAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(Self::state())
                }
                Behavior::FailAttempt(reason) => Err(Error::socket(
                    "connect",
                    io::Error::new(io::ErrorKind::ConnectionRefused, reason),
                )),
                Behavior::TimeoutTimes(n) if attempt <= n => pending().await,
                Behavior::TimeoutTimes(_) => Ok(Self::state()),
                Behavior::AlwaysTimeout => pending().await,
            };

            self.shared.events.lock().unwrap().push(('e', self.ip));
            result
        }
    }

    impl DeviceClient for MockClient {
        async fn apply_state(&self, _payload: &Payload) -> Result<DeviceState, Error> {
            self.perform().await
        }

        async fn query_state(&self) -> Result<DeviceState, Error> {
            self.perform().await
        }

        async fn close(&self) -> Result<(), Error> {
            self.shared.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct MockConnector {
        behaviors: HashMap<Ipv4Addr, Behavior>,
        default: Behavior,
        shared: Arc<Shared>,
    }

    impl MockConnector {
        fn uniform(behavior: Behavior) -> Self {
            MockConnector {
                behaviors: HashMap::new(),
                default: behavior,
                shared: Arc::new(Shared::default()),
            }
        }

        fn scripted(behaviors: impl IntoIterator<Item = (Ipv4Addr, Behavior)>) -> Self {
            MockConnector {
                behaviors: behaviors.into_iter().collect(),
                default: Behavior::Succeed,
                shared: Arc::new(Shared::default()),
            }
        }

        fn shared(&self) -> Arc<Shared> {
            Arc::clone(&self.shared)
        }
    }

    impl Connect for MockConnector {
        type Client = MockClient;

        async fn connect(&self, ip: Ipv4Addr) -> Result<MockClient, Error> {
            let behavior = *self.behaviors.get(&ip).unwrap_or(&self.default);
            if matches!(behavior, Behavior::RefuseConnect) {
                return Err(Error::socket(
                    "connect",
                    io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
                ));
            }

            self.shared.connects.fetch_add(1, Ordering::SeqCst);
            Ok(MockClient {
                ip,
                behavior,
                attempts: AtomicU32::new(0),
                shared: Arc::clone(&self.shared),
            })
        }
    }

    fn ip(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    fn ips(count: u8) -> Vec<Ipv4Addr> {
        (1..=count).map(ip).collect()
    }

    #[tokio::test]
    async fn test_empty_targets_performs_no_io() {
        let connector = MockConnector::uniform(Behavior::Succeed);
        let shared = connector.shared();
        let controller = FanoutController::new(connector);

        let result = controller
            .run(&[], &Operation::TurnOn, SuccessPolicy::All)
            .await;

        assert!(!result.overall_success);
        assert_eq!(result.total_count, 0);
        assert_eq!(result.success_count, 0);
        assert!(result.results.is_empty());
        assert_eq!(shared.connects.load(Ordering::SeqCst), 0);
        assert_eq!(shared.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_turn_off_three_bulbs_in_batches_of_two() {
        let connector = MockConnector::uniform(Behavior::Succeed);
        let controller = FanoutController::with_config(
            connector,
            FanoutConfig {
                batch_size: 2,
                ..FanoutConfig::default()
            },
        );

        let targets = ips(3);
        let result = controller
            .run(&targets, &Operation::TurnOff, SuccessPolicy::All)
            .await;

        assert!(result.overall_success);
        assert_eq!(result.success_count, 3);
        assert_eq!(result.total_count, 3);
        assert_eq!(result.success_rate, 100.0);
        assert_eq!(result.results.len(), 3);
        for (entry, target) in result.results.iter().zip(&targets) {
            assert_eq!(entry.ip, *target);
            assert!(entry.success);
            assert_eq!(entry.attempts, 1);
            assert_eq!(entry.message, "turn off succeeded");
        }
    }

    #[tokio::test]
    async fn test_refused_connection_is_terminal() {
        let connector = MockConnector::uniform(Behavior::RefuseConnect);
        let controller = FanoutController::new(connector);

        let result = controller
            .run(&[ip(1)], &Operation::TurnOn, SuccessPolicy::All)
            .await;

        assert!(!result.overall_success);
        assert_eq!(result.results.len(), 1);
        let entry = &result.results[0];
        assert!(!entry.success);
        assert_eq!(entry.attempts, 1);
        assert!(entry.message.contains("refused"), "{}", entry.message);
    }

    #[tokio::test]
    async fn test_device_error_is_never_retried() {
        let connector = MockConnector::uniform(Behavior::FailAttempt("protocol error"));
        let shared = connector.shared();
        let controller = FanoutController::new(connector);

        let result = controller
            .run(&[ip(1)], &Operation::QueryState, SuccessPolicy::All)
            .await;

        let entry = &result.results[0];
        assert!(!entry.success);
        assert_eq!(entry.attempts, 1);
        assert!(entry.message.contains("protocol error"));
        // The one client that was opened still gets closed.
        assert_eq!(shared.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_are_retried_until_success() {
        // Three timed-out attempts, then success on the fourth: exactly
        // the retry budget with max_retries = 3.
        let connector = MockConnector::uniform(Behavior::TimeoutTimes(3));
        let shared = connector.shared();
        let controller = FanoutController::new(connector);

        let result = controller
            .run(&[ip(1)], &Operation::TurnOn, SuccessPolicy::All)
            .await;

        assert!(result.overall_success);
        let entry = &result.results[0];
        assert!(entry.success);
        assert_eq!(entry.attempts, 4);
        assert_eq!(entry.message, "turn on succeeded");
        // Retries reuse the cached client rather than reconnecting.
        assert_eq!(shared.connects.load(Ordering::SeqCst), 1);
        assert_eq!(shared.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retry_budget_fails_the_target() {
        let connector = MockConnector::uniform(Behavior::AlwaysTimeout);
        let controller = FanoutController::new(connector);

        let result = controller
            .run(&[ip(1)], &Operation::TurnOn, SuccessPolicy::All)
            .await;

        let entry = &result.results[0];
        assert!(!entry.success);
        assert_eq!(entry.attempts, 4);
        assert_eq!(entry.message, "operation timed out after 4 attempts");
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_slow_target_does_not_disturb_the_rest() {
        let connector = MockConnector::scripted([
            (ip(2), Behavior::AlwaysTimeout),
            (ip(3), Behavior::SucceedAfter(Duration::from_millis(50))),
        ]);
        let controller = FanoutController::with_config(
            connector,
            FanoutConfig {
                batch_size: 4,
                ..FanoutConfig::default()
            },
        );

        let targets = ips(4);
        let result = controller
            .run(
                &targets,
                &Operation::SetColor {
                    color: Color::rgb(255, 0, 0),
                    brightness: None,
                },
                SuccessPolicy::All,
            )
            .await;

        assert!(!result.overall_success);
        assert_eq!(result.success_count, 3);
        assert_eq!(result.total_count, 4);
        assert!((result.success_rate - 75.0).abs() < 1e-9);
        // Input order is preserved regardless of completion order.
        let order: Vec<Ipv4Addr> = result.results.iter().map(|r| r.ip).collect();
        assert_eq!(order, targets);
        assert!(!result.results[1].success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_run_sequentially() {
        let connector =
            MockConnector::uniform(Behavior::SucceedAfter(Duration::from_millis(10)));
        let shared = connector.shared();
        let controller = FanoutController::with_config(
            connector,
            FanoutConfig {
                batch_size: 2,
                ..FanoutConfig::default()
            },
        );

        let targets = ips(4);
        controller
            .run(&targets, &Operation::TurnOn, SuccessPolicy::All)
            .await;

        // Every start from the second batch appears after every end from
        // the first.
        let events = shared.events.lock().unwrap();
        let first_batch_done = events
            .iter()
            .rposition(|&(kind, addr)| kind == 'e' && (addr == ip(1) || addr == ip(2)))
            .unwrap();
        let second_batch_started = events
            .iter()
            .position(|&(kind, addr)| kind == 's' && (addr == ip(3) || addr == ip(4)))
            .unwrap();
        assert!(first_batch_done < second_batch_started, "{events:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_caps_in_flight_operations() {
        let connector =
            MockConnector::uniform(Behavior::SucceedAfter(Duration::from_millis(10)));
        let shared = connector.shared();
        // batch_size well above max_concurrent: the limiter is the only
        // thing holding the line.
        let controller = FanoutController::with_config(
            connector,
            FanoutConfig {
                max_concurrent: 3,
                batch_size: 30,
                ..FanoutConfig::default()
            },
        );

        let result = controller
            .run(&ips(30), &Operation::TurnOn, SuccessPolicy::All)
            .await;

        assert!(result.overall_success);
        assert_eq!(result.total_count, 30);
        assert!(shared.max_active.load(Ordering::SeqCst) <= 3);
        assert_eq!(shared.closes.load(Ordering::SeqCst), 30);
    }

    #[tokio::test]
    async fn test_any_policy_for_discovery_style_runs() {
        let connector = MockConnector::scripted([
            (ip(1), Behavior::RefuseConnect),
            (ip(2), Behavior::Succeed),
            (ip(3), Behavior::RefuseConnect),
        ]);
        let controller = FanoutController::new(connector);

        let result = controller
            .run(&ips(3), &Operation::QueryState, SuccessPolicy::Any)
            .await;

        assert!(result.overall_success);
        assert_eq!(result.success_count, 1);

        let connector = MockConnector::uniform(Behavior::RefuseConnect);
        let controller = FanoutController::new(connector);
        let result = controller
            .run(&ips(3), &Operation::QueryState, SuccessPolicy::Any)
            .await;
        assert!(!result.overall_success);
    }

    #[tokio::test]
    async fn test_white_channel_operations_report_their_name() {
        let connector = MockConnector::uniform(Behavior::Succeed);
        let controller = FanoutController::new(connector);

        let warm = White::create(80).unwrap();
        let result = controller
            .run(&[ip(1)], &Operation::SetWarmWhite(warm), SuccessPolicy::All)
            .await;
        assert_eq!(result.results[0].message, "set warm white succeeded");

        let cold = White::create(80).unwrap();
        let result = controller
            .run(&[ip(1)], &Operation::SetColdWhite(cold), SuccessPolicy::All)
            .await;
        assert_eq!(result.results[0].message, "set cold white succeeded");
    }
}
