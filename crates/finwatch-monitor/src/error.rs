//! Monitor errors

use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

/// Failure inside a single rule.
///
/// Date math in the rules is bounded, so the calendar variants only surface
/// at the edges of the representable calendar. Amount arithmetic is checked
/// and reports overflow instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("invalid calendar date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("no calendar day precedes {0}")]
    NoPreviousDay(NaiveDate),

    #[error("amount overflow computing {0}")]
    Overflow(&'static str),
}

/// Result type for rule evaluation
pub type RuleResult<T> = Result<T, RuleError>;

/// Failure reported by a data source or notifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("{0} is unavailable")]
    Unavailable(String),
}

/// Result type for collaborator calls
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Why a pass did not complete cleanly.
///
/// Never fatal: the loop logs it and retries on the next tick.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("{what} failed: {source}")]
    Collaborator {
        what: &'static str,
        #[source]
        source: CollaboratorError,
    },

    #[error("{what} timed out after {timeout:?}")]
    Timeout { what: &'static str, timeout: Duration },

    /// Takes precedence over `Evaluation`; rule failures from the same pass
    /// ride along in `rule_failures`.
    #[error("{failed} of {attempted} alert deliveries failed ({} rule failure(s))", .rule_failures.len())]
    Delivery {
        failed: usize,
        attempted: usize,
        rule_failures: Vec<RuleError>,
    },

    #[error("{} rule(s) failed to evaluate", .0.len())]
    Evaluation(Vec<RuleError>),
}

/// Result type for a single pass
pub type PassResult<T> = Result<T, PassError>;
