use thiserror::Error;

use crate::domain::item::ItemStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid item transition from {from:?} to {to:?}")]
    InvalidStatusTransition { from: ItemStatus, to: ItemStatus },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}
