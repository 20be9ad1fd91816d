//! Errors raised while constructing samplers and rate limiters.

/// Construction errors. Sampling decisions themselves never fail.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A rate or capacity parameter is negative, NaN, or infinite.
    #[error("Invalid configuration: {name} = {value}. Value must be finite and non-negative.")]
    InvalidConfiguration {
        /// The parameter that was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// An explicitly supplied collaborator was absent.
    #[error("Invalid argument: {0} must be provided")]
    InvalidArgument(&'static str),
}

/// Checks that a rate-like parameter is finite and non-negative.
pub(crate) fn validate_non_negative(name: &'static str, value: f64) -> Result<f64, Error> {
    if !value.is_finite() || value < 0.0 {
        tracing::warn!(parameter = name, value, "rejecting sampler configuration");
        return Err(Error::InvalidConfiguration { name, value });
    }
    Ok(value)
}
