//! Error taxonomy.
//!
//! Validation failures are data, not errors: they travel in an [`ErrorMap`]
//! keyed by field path and never abort the caller. [`FormError`] is reserved
//! for API misuse (bad paths, unknown fields, submit reentry).

use std::collections::BTreeMap;

use thiserror::Error;

use crate::path::PathError;

/// Which rule rejected the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    RequiredMissing,
    PatternMismatch,
    CustomRuleFailed,
}

/// First failing rule for a field, with its user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub kind: ValidationKind,
    pub message: String,
}

impl FieldError {
    pub(crate) fn new(kind: ValidationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Per-field validation outcome keyed by field path. Ordered so renderers and
/// logs see fields in a stable sequence.
pub type ErrorMap = BTreeMap<String, FieldError>;

#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("no field registered at `{0}`")]
    Unregistered(String),
    #[error("`{0}` is not a list field")]
    NotAList(String),
    #[error("index {index} out of bounds for list `{path}` (len {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
    #[error("list `{0}` must keep at least one entry")]
    MinimumLength(String),
    #[error("a submit is already in progress")]
    SubmitInProgress,
    #[error("default snapshot did not serialize: {0}")]
    Defaults(#[from] serde_json::Error),
}
