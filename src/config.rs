use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::sampler::RateLimitingSampler;

/// Declarative configuration for a [`RateLimitingSampler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitingSamplerConfig {
    /// Maximum sampled traces per second
    pub max_traces_per_second: f64,
}

impl RateLimitingSamplerConfig {
    pub fn new(max_traces_per_second: f64) -> Self {
        RateLimitingSamplerConfig {
            max_traces_per_second,
        }
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Builds the sampler, validating the configured rate.
    pub fn build(&self) -> Result<RateLimitingSampler, Error> {
        RateLimitingSampler::new(self.max_traces_per_second)
    }
}
