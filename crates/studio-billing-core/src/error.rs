//! Error types for studio-billing core.

/// Errors raised while resolving the cost of a feature usage.
#[derive(Debug, thiserror::Error)]
pub enum CostError {
    /// The feature tag is not in the price table and no explicit cost was
    /// supplied.
    #[error("unknown feature type: {0}")]
    UnknownFeatureType(String),
}
