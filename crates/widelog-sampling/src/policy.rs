//! Keep/drop decisions for finalized events.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use widelog_events::{Outcome, WideEvent};

/// Default probability of keeping an unremarkable event.
pub const DEFAULT_SAMPLE_RATE: f64 = 0.1;

/// Default duration above which an event is always kept.
pub const DEFAULT_SLOW_THRESHOLD_MS: u64 = 2000;

/// Default subscription tiers that are always kept.
pub const DEFAULT_ALWAYS_KEEP_SUBSCRIPTIONS: &[&str] = &["enterprise", "premium"];

/// Tunables for the default tail-sampling rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingOptions {
    /// Probability of keeping an event no rule selected, in `[0, 1]`.
    pub sample_rate: f64,
    /// Events slower than this are always kept.
    pub slow_threshold_ms: u64,
    /// Subscription tiers that are always kept.
    pub always_keep_subscriptions: HashSet<String>,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            slow_threshold_ms: DEFAULT_SLOW_THRESHOLD_MS,
            always_keep_subscriptions: DEFAULT_ALWAYS_KEEP_SUBSCRIPTIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl SamplingOptions {
    /// Set the sample rate.
    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the slow-request threshold.
    #[must_use]
    pub fn with_slow_threshold_ms(mut self, slow_threshold_ms: u64) -> Self {
        self.slow_threshold_ms = slow_threshold_ms;
        self
    }

    /// Replace the always-kept subscription tiers.
    #[must_use]
    pub fn with_always_keep_subscriptions<I, S>(mut self, tiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.always_keep_subscriptions = tiers.into_iter().map(Into::into).collect();
        self
    }
}

/// Apply the default tail-sampling rule using the thread-local RNG.
#[must_use]
pub fn should_keep(event: &WideEvent, options: &SamplingOptions) -> bool {
    should_keep_with_rng(event, options, &mut rand::thread_rng())
}

/// Apply the default tail-sampling rule with an explicit RNG.
///
/// Rules are checked in order, first match wins: error outcome, 5xx
/// status, captured error, slow request, always-kept subscription. Anything
/// else is kept with probability `sample_rate`.
pub fn should_keep_with_rng<R>(event: &WideEvent, options: &SamplingOptions, rng: &mut R) -> bool
where
    R: Rng + ?Sized,
{
    if event.outcome == Outcome::Error {
        return true;
    }
    if event.request.status_code >= 500 {
        return true;
    }
    if event.error.is_some() {
        return true;
    }
    if event.request.duration_ms > options.slow_threshold_ms {
        return true;
    }
    if event
        .subscription()
        .is_some_and(|tier| options.always_keep_subscriptions.contains(tier))
    {
        return true;
    }
    draw(options.sample_rate, rng)
}

fn draw<R>(rate: f64, rng: &mut R) -> bool
where
    R: Rng + ?Sized,
{
    if rate.is_nan() || rate <= 0.0 {
        return false;
    }
    if rate >= 1.0 {
        return true;
    }
    rng.gen_bool(rate)
}

/// Keep every event.
#[must_use]
pub fn keep_all(_event: &WideEvent) -> bool {
    true
}

/// Keep only failed or rejected requests: error outcome, any status of
/// 400 or above, or a captured error.
#[must_use]
pub fn keep_only_errors(event: &WideEvent) -> bool {
    event.outcome == Outcome::Error || event.request.status_code >= 400 || event.error.is_some()
}

/// A keep/drop decision over finalized events.
///
/// Any `Fn(&WideEvent) -> bool` closure is a sampler.
pub trait Sampler: Send + Sync {
    /// Decide whether to keep `event`.
    fn should_keep(&self, event: &WideEvent) -> bool;
}

impl<F> Sampler for F
where
    F: Fn(&WideEvent) -> bool + Send + Sync,
{
    fn should_keep(&self, event: &WideEvent) -> bool {
        self(event)
    }
}

/// The default tail-sampling rule.
#[derive(Debug, Clone, Default)]
pub struct TailSampler {
    options: SamplingOptions,
}

impl TailSampler {
    /// Create a sampler with the given options.
    #[must_use]
    pub fn new(options: SamplingOptions) -> Self {
        Self { options }
    }

    /// Get the options.
    #[must_use]
    pub fn options(&self) -> &SamplingOptions {
        &self.options
    }
}

impl Sampler for TailSampler {
    fn should_keep(&self, event: &WideEvent) -> bool {
        should_keep(event, &self.options)
    }
}

/// Sampler that keeps everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl Sampler for KeepAll {
    fn should_keep(&self, event: &WideEvent) -> bool {
        keep_all(event)
    }
}

/// Sampler that keeps only errors and 4xx/5xx responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepOnlyErrors;

impl Sampler for KeepOnlyErrors {
    fn should_keep(&self, event: &WideEvent) -> bool {
        keep_only_errors(event)
    }
}

/// Shared, type-erased sampler.
#[derive(Clone)]
pub struct SharedSampler(Arc<dyn Sampler>);

impl SharedSampler {
    /// Wrap a sampler.
    pub fn new<S>(sampler: S) -> Self
    where
        S: Sampler + 'static,
    {
        Self(Arc::new(sampler))
    }
}

impl Default for SharedSampler {
    fn default() -> Self {
        Self::new(TailSampler::default())
    }
}

impl Sampler for SharedSampler {
    fn should_keep(&self, event: &WideEvent) -> bool {
        self.0.should_keep(event)
    }
}

impl fmt::Debug for SharedSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSampler").finish_non_exhaustive()
    }
}
