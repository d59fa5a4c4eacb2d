pub mod market;
pub mod strategy;
pub mod vision;

use thiserror::Error;

use crate::adapters::AdapterError;
use crate::retry::RetryError;

/// Stage-level failures. None of these are retryable at this level: the
/// retry budget has already been spent (or the failure is a domain one) by
/// the time a `StageError` is produced.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StageError {
    #[error(
        "garment type `{garment_type}` confidence {confidence:.1} is below the {threshold:.1} threshold"
    )]
    LowConfidence { garment_type: String, confidence: f64, threshold: f64 },
    #[error("unusable response from {service}: {reason}")]
    MalformedResponse { service: String, reason: String },
    #[error("no usable strategy candidates were returned")]
    EmptyCandidateSet,
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    ServiceExhausted { operation: String, attempts: u32, last_error: String },
    #[error("{operation} was rejected: {reason}")]
    ServiceRejected { operation: String, reason: String },
}

impl From<RetryError<AdapterError>> for StageError {
    fn from(error: RetryError<AdapterError>) -> Self {
        match error {
            RetryError::Exhausted { operation, attempts, last_error } => Self::ServiceExhausted {
                operation,
                attempts,
                last_error: last_error.to_string(),
            },
            RetryError::Fatal { error: AdapterError::Malformed { service, reason }, .. } => {
                Self::MalformedResponse { service: service.to_string(), reason }
            }
            RetryError::Fatal { operation, error } => {
                Self::ServiceRejected { operation, reason: error.to_string() }
            }
        }
    }
}
