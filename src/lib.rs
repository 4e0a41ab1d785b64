//! # wiz_fanout
//!
//! An async Rust library for fanning out commands to many Philips Wiz
//! smart lights at once over UDP.
//!
//! The heart of the crate is [`FanoutController`]: it takes a list of
//! target addresses and one [`Operation`] (power on/off, RGB color, warm
//! or cold white intensity, status query) and applies it to every target
//! with bounded concurrency, sequential batches, per-attempt timeouts, and
//! timeout-only retries. Each target's outcome is isolated — one
//! unreachable bulb never disturbs the rest — and the run aggregates into
//! a single [`FanoutResult`] with one ordered entry per target.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use wiz_fanout::{
//!     Color, FanoutController, Operation, SuccessPolicy, WizConnector,
//!     broadcast_address, discover_bulbs,
//! };
//!
//! async fn paint_the_house_red() -> Result<(), wiz_fanout::Error> {
//!     let bulbs = discover_bulbs(broadcast_address(), Duration::from_secs(5)).await?;
//!     let targets: Vec<_> = bulbs.iter().map(|b| b.ip).collect();
//!
//!     let controller = FanoutController::new(WizConnector);
//!     let op = Operation::SetColor {
//!         color: Color::rgb(255, 0, 0),
//!         brightness: None,
//!     };
//!     let result = controller.run(&targets, &op, SuccessPolicy::All).await;
//!     println!("{}/{} bulbs updated", result.success_count, result.total_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Fan-out behavior
//!
//! - Targets are processed in consecutive batches of
//!   [`FanoutConfig::batch_size`]; a batch must fully finish before the
//!   next one starts, bounding burst load on the network.
//! - A global semaphore caps simultaneous in-flight operations at
//!   [`FanoutConfig::max_concurrent`].
//! - Every attempt is time-boxed by [`FanoutConfig::attempt_timeout`];
//!   only timed-out attempts are retried (up to
//!   [`FanoutConfig::max_retries`] extra attempts) — connection and
//!   protocol errors are terminal for their target immediately.
//! - Connections are cached per target for the duration of one run and
//!   always closed before the run returns.
//!
//! ## Communication
//!
//! All communication with Wiz bulbs occurs over UDP on port 38899. The
//! bulbs must be on the same local network. Discovery probes the network
//! with a broadcast registration message; the broadcast address can be
//! overridden with the `BROADCAST_ADDRESS` environment variable.

mod client;
mod config;
mod controller;
mod discovery;
mod errors;
mod operation;
mod payload;
mod result;
mod status;
mod types;

// Re-export public API
pub use client::{Connect, DeviceClient, WizClient, WizConnector};
pub use config::{BROADCAST_ADDRESS_ENV, FanoutConfig, broadcast_address};
pub use controller::FanoutController;
pub use discovery::{DiscoveredBulb, discover_bulbs};
pub use errors::Error;
pub use operation::Operation;
pub use payload::Payload;
pub use result::{FanoutResult, SuccessPolicy, TargetResult};
pub use status::DeviceState;
pub use types::{Brightness, Color, PowerMode, White};
