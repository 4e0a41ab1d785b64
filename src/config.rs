//! Fan-out tuning parameters.

use std::env;
use std::net::Ipv4Addr;
use std::time::Duration;

use log::warn;

/// Environment variable overriding the discovery broadcast address.
pub const BROADCAST_ADDRESS_ENV: &str = "BROADCAST_ADDRESS";

const DEFAULT_BROADCAST: Ipv4Addr = Ipv4Addr::BROADCAST;

/// Tuning parameters for a fan-out run.
///
/// The defaults bound burst load on a home network while keeping a large
/// run moving: small sequential batches, a generous global in-flight cap,
/// and a few retries for attempts that time out.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use wiz_fanout::FanoutConfig;
///
/// let config = FanoutConfig {
///     batch_size: 8,
///     ..FanoutConfig::default()
/// };
/// assert_eq!(config.max_concurrent, 100);
/// assert_eq!(config.attempt_timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FanoutConfig {
    /// Maximum number of per-target operations in flight at once.
    pub max_concurrent: usize,
    /// Number of targets started together before waiting for the group.
    pub batch_size: usize,
    /// Deadline for a single attempt against a single target.
    pub attempt_timeout: Duration,
    /// Additional attempts after a first timed-out attempt.
    pub max_retries: u32,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        FanoutConfig {
            max_concurrent: 100,
            batch_size: 2,
            attempt_timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }
}

impl FanoutConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The broadcast address used for discovery probes.
///
/// Honors the `BROADCAST_ADDRESS` environment variable (e.g. a subnet
/// broadcast like `192.168.18.255`); falls back to the limited broadcast
/// address when unset or unparseable.
pub fn broadcast_address() -> Ipv4Addr {
    match env::var(BROADCAST_ADDRESS_ENV) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("ignoring unparseable {BROADCAST_ADDRESS_ENV}={raw:?}");
            DEFAULT_BROADCAST
        }),
        Err(_) => DEFAULT_BROADCAST,
    }
}
