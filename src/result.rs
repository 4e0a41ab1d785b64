//! Per-target and aggregate fan-out outcomes.

use std::net::Ipv4Addr;

use serde::Serialize;

use crate::status::DeviceState;

/// How a run's aggregate success is judged from its per-target outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessPolicy {
    /// The run succeeded only if every target succeeded. Used for control
    /// operations, where a partially applied change is a failure the caller
    /// must see.
    All,
    /// The run succeeded if at least one target succeeded. Used for
    /// discovery-style runs, where finding anything at all is the point.
    Any,
}

/// The terminal outcome for one target. Immutable once produced.
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TargetResult {
    /// The address this outcome belongs to.
    pub ip: Ipv4Addr,
    /// Whether the operation was applied.
    pub success: bool,
    /// How many attempts were made (1 unless timeouts were retried).
    pub attempts: u32,
    /// Human-readable description of the outcome.
    pub message: String,
    /// The reported device state, present on success.
    pub state: Option<DeviceState>,
}

impl TargetResult {
    /// A successful outcome carrying the device's state.
    pub fn ok(ip: Ipv4Addr, attempts: u32, state: DeviceState, message: String) -> Self {
        TargetResult {
            ip,
            success: true,
            attempts,
            message,
            state: Some(state),
        }
    }

    /// A terminal failure for this target.
    pub fn failure(ip: Ipv4Addr, attempts: u32, message: String) -> Self {
        TargetResult {
            ip,
            success: false,
            attempts,
            message,
            state: None,
        }
    }
}

/// The aggregate outcome of one fan-out run.
///
/// `results` holds exactly one entry per input target, in input order.
/// Serializes to the JSON shape the CLI emits (`success`, `success_count`,
/// `total_count`, `success_rate`, `results`).
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FanoutResult {
    #[serde(rename = "success")]
    pub overall_success: bool,
    pub success_count: usize,
    pub total_count: usize,
    /// Percentage of targets that succeeded; 0.0 for an empty run.
    pub success_rate: f64,
    pub results: Vec<TargetResult>,
}

impl FanoutResult {
    /// Aggregate per-target outcomes under the given policy.
    ///
    /// An empty run is never a success: with no targets there is nothing
    /// the run can claim to have done.
    pub fn aggregate(results: Vec<TargetResult>, policy: SuccessPolicy) -> Self {
        let total_count = results.len();
        let success_count = results.iter().filter(|r| r.success).count();
        let success_rate = if total_count == 0 {
            0.0
        } else {
            success_count as f64 / total_count as f64 * 100.0
        };
        let overall_success = match policy {
            _ if total_count == 0 => false,
            SuccessPolicy::All => success_count == total_count,
            SuccessPolicy::Any => success_count > 0,
        };

        FanoutResult {
            overall_success,
            success_count,
            total_count,
            success_rate,
            results,
        }
    }

    /// The result of a run given no targets.
    pub fn empty() -> Self {
        Self::aggregate(Vec::new(), SuccessPolicy::All)
    }
}
