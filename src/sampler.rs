use std::sync::Arc;

use opentelemetry::trace::{
    Link, SamplingDecision, SamplingResult, SpanKind, TraceContextExt, TraceId, TraceState,
};
use opentelemetry::{Context, Key, KeyValue, Value};
use opentelemetry_sdk::trace::ShouldSample;

use crate::error::{Error, validate_non_negative};
use crate::ratelimit::{CreditLimiter, RateLimiter};
use crate::{
    SAMPLER_PARAM_TAG_KEY, SAMPLER_TYPE_RATE_LIMITING, SAMPLER_TYPE_TAG_KEY, Sampler, Tags,
};

/// Every sampling decision costs one credit.
const DECISION_COST: f64 = 1.0;

/// RateLimitingSampler samples at most `max_traces_per_second` traces.
///
/// Sampled traces follow the burstiness of the service: uniformly spaced
/// requests are sampled uniformly, while sub-second bursts may see several
/// consecutive requests sampled. The limit is global across trace ids and
/// operation names.
///
/// Clones share the same rate limiter, so the bound holds across all of
/// them.
#[derive(Debug, Clone)]
pub struct RateLimitingSampler {
    max_traces_per_second: f64,
    rate_limiter: Arc<dyn CreditLimiter>,
    tags: Tags,
}

impl RateLimitingSampler {
    /// Create a new RateLimitingSampler backed by a default rate limiter.
    ///
    /// The limiter refills at `max_traces_per_second` and holds
    /// `max(max_traces_per_second, 1.0)` credits, so even very low rates
    /// admit one trace immediately.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` if `max_traces_per_second` is
    /// negative, NaN, or infinite.
    pub fn new(max_traces_per_second: f64) -> Result<Self, Error> {
        let max_traces_per_second =
            validate_non_negative("max_traces_per_second", max_traces_per_second)?;
        let rate_limiter =
            RateLimiter::new(max_traces_per_second, max_traces_per_second.max(1.0))?;
        Ok(Self::build(max_traces_per_second, Arc::new(rate_limiter)))
    }

    /// Create a new RateLimitingSampler that consults `rate_limiter`.
    ///
    /// `max_traces_per_second` is only reported in tags; the limiter alone
    /// decides.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` for an invalid rate and
    /// `Error::InvalidArgument` if `rate_limiter` is `None`.
    pub fn with_rate_limiter(
        max_traces_per_second: f64,
        rate_limiter: Option<Arc<dyn CreditLimiter>>,
    ) -> Result<Self, Error> {
        let max_traces_per_second =
            validate_non_negative("max_traces_per_second", max_traces_per_second)?;
        let rate_limiter = rate_limiter.ok_or(Error::InvalidArgument("rate_limiter"))?;
        Ok(Self::build(max_traces_per_second, rate_limiter))
    }

    fn build(max_traces_per_second: f64, rate_limiter: Arc<dyn CreditLimiter>) -> Self {
        let tags = Tags::from([
            (
                Key::from_static_str(SAMPLER_TYPE_TAG_KEY),
                Value::from(SAMPLER_TYPE_RATE_LIMITING),
            ),
            (
                Key::from_static_str(SAMPLER_PARAM_TAG_KEY),
                Value::F64(max_traces_per_second),
            ),
        ]);

        tracing::debug!(max_traces_per_second, ?rate_limiter, "created rate limiting sampler");

        RateLimitingSampler {
            max_traces_per_second,
            rate_limiter,
            tags,
        }
    }

    pub fn max_traces_per_second(&self) -> f64 {
        self.max_traces_per_second
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }
}

impl Sampler for RateLimitingSampler {
    fn is_sampled(&self, _trace_id: TraceId, _operation_name: &str) -> (bool, &Tags) {
        (self.rate_limiter.check_credit(DECISION_COST), &self.tags)
    }
}

impl ShouldSample for RateLimitingSampler {
    fn should_sample(
        &self,
        parent_context: Option<&Context>,
        trace_id: TraceId,
        name: &str,
        _span_kind: &SpanKind,
        _attributes: &[KeyValue],
        _links: &[Link],
    ) -> SamplingResult {
        let trace_state = parent_context
            .filter(|cx| cx.has_active_span())
            .map_or_else(TraceState::default, |cx| {
                cx.span().span_context().trace_state().clone()
            });

        let (sampled, tags) = self.is_sampled(trace_id, name);
        if !sampled {
            return SamplingResult {
                decision: SamplingDecision::Drop,
                attributes: Vec::new(),
                trace_state,
            };
        }

        SamplingResult {
            decision: SamplingDecision::RecordAndSample,
            attributes: tags
                .iter()
                .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
                .collect(),
            trace_state,
        }
    }
}
