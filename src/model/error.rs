//! Model construction errors.

use super::variables::{ShiftKey, VarId};
use thiserror::Error;

/// Errors raised while building a [`Model`](super::Model).
///
/// Every error is reported at the offending call; the builder is left
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("variable {0} is already declared")]
    DuplicateVariable(ShiftKey),

    #[error("variable {0} is not declared")]
    UnknownVariable(ShiftKey),

    #[error("handle {0} does not belong to this model")]
    UnknownHandle(VarId),

    #[error("constraint has no terms")]
    EmptyConstraint,

    #[error("objective has no terms")]
    EmptyObjective,

    #[error("model already has an objective")]
    ObjectiveAlreadySet,

    #[error("model is finalized and can no longer be modified")]
    Frozen,

    #[error("merged coefficient of {0} does not fit in i64")]
    CoefficientOverflow(VarId),

    #[error("invalid instance: {0}")]
    InvalidInstance(String),
}
