// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! A rate-limiting trace sampler.
//!
//! [`RateLimitingSampler`] admits at most `max_traces_per_second` traces per
//! second on average, while allowing short bursts after quiet periods. The
//! decision is made by a [`RateLimiter`], a continuously refilling credit
//! bucket shared by every caller of one sampler.
use std::collections::HashMap;
use std::fmt::Debug;

use opentelemetry::trace::TraceId;
use opentelemetry::{Key, Value};

pub mod config;
pub mod error;
pub mod ratelimit;
pub mod sampler;

pub use config::RateLimitingSamplerConfig;
pub use error::Error;
pub use ratelimit::{Clock, CreditLimiter, MonoClock, RateLimiter};
pub use sampler::RateLimitingSampler;

/// Tag key naming the kind of sampler that made a decision.
pub const SAMPLER_TYPE_TAG_KEY: &str = "sampler.type";

/// Tag key carrying the sampler's configuration parameter.
pub const SAMPLER_PARAM_TAG_KEY: &str = "sampler.param";

/// Value of `sampler.type` for the rate-limiting sampler.
pub const SAMPLER_TYPE_RATE_LIMITING: &str = "ratelimiting";

/// Tags describing a sampling decision, keyed by tag name.
pub type Tags = HashMap<Key, Value>;

/// Sampler is the decision capability shared by every sampler variant.
///
/// Each call receives the trace being started and returns whether to record
/// it, along with tags describing the sampler. The tags are borrowed from
/// the sampler and are the same for every call.
pub trait Sampler: Send + Sync + Debug {
    /// Decides whether the trace identified by `trace_id` should be recorded
    /// and returns the decision with this sampler's tags.
    fn is_sampled(&self, trace_id: TraceId, operation_name: &str) -> (bool, &Tags);

    /// Releases resources held by the sampler.
    fn close(&self) {}
}
