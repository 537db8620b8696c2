//! Widelog Sampling - Tail sampling for finalized wide events.
//!
//! Sampling runs once per event after the request has completed, so the
//! decision can look at everything: outcome, status, duration and who the
//! caller was. The default rule keeps every failure, every slow request and
//! every request from a premium tier, and a random fraction of the rest.
//!
//! # Example
//!
//! ```rust
//! use widelog_events::{ServiceInfo, WideEvent};
//! use widelog_sampling::{SamplingOptions, should_keep};
//!
//! let mut event = WideEvent::new(ServiceInfo::new("api"));
//! event.set_status_code(503);
//!
//! let options = SamplingOptions::default().with_sample_rate(0.0);
//! assert!(should_keep(&event, &options));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod policy;

pub use policy::{
    DEFAULT_ALWAYS_KEEP_SUBSCRIPTIONS, DEFAULT_SAMPLE_RATE, DEFAULT_SLOW_THRESHOLD_MS, KeepAll,
    KeepOnlyErrors, Sampler, SamplingOptions, SharedSampler, TailSampler, keep_all,
    keep_only_errors, should_keep, should_keep_with_rng,
};
