//! # Error Taxonomy
//!
//! Two kinds of failure abort an exploration attempt:
//!
//! - **`ValidationError`**: a value could not be constructed because it violates its
//!   declared type's domain (e.g. a text literal longer than its `varchar(n)` bound).
//!   Raised at construction, before the value can reach any rule.
//! - **`ExploreError::InvariantViolation`**: an upstream contract was broken, e.g. an
//!   inner join without a condition reached a reorder rule, or a Project references a
//!   column its child does not produce. These are programming errors in whoever built
//!   the plan.
//!
//! A rule that simply does not apply is *not* an error; see
//! [`RuleOutcome::Declined`](crate::rule::RuleOutcome).

use crate::types::DataType;

/// Failure to construct a typed value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("value of length {actual} exceeds the declared length of {data_type}")]
    LengthExceeded { data_type: DataType, actual: usize },
    #[error("value {value} is not a member of type {data_type}")]
    TypeMismatch { data_type: DataType, value: String },
    #[error("varchar length {0} is out of range 1..={max}", max = DataType::MAX_VARCHAR_LENGTH)]
    InvalidVarcharLength(u32),
}

/// Errors that abort the current exploration attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExploreError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl ExploreError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        ExploreError::InvariantViolation(msg.into())
    }
}

pub type ExploreResult<T> = Result<T, ExploreError>;
