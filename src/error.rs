//! Custom error types for the motor record.
//!
//! This module defines the primary error type, `MotorError`, for the crate.
//! Using the `thiserror` crate, it provides a centralized and consistent way
//! to report the ways a field write can be refused:
//!
//! - **`InvalidResolution`**: the MRES field is zero, which makes the
//!   user/raw conversion undefined. Any write that would need the conversion
//!   is rejected and the record keeps its previous values.
//! - **`InvalidVelocity`**: the VELO field was non-positive at move-start
//!   time. The move is refused and the axis stays idle.
//! - **`NonFiniteValue`**: a NaN or infinite value reached a field write.
//!   Rejected before any state changes; NaN in particular would defeat both
//!   limit comparisons and move-completion checks.
//! - **`LimitViolation`**: a requested target fell outside the enforced soft
//!   limits. The write is rejected outright; this record type never clamps.
//!
//! All errors are local to the single write that raised them. None are fatal
//! to the record or the process; the hosting framework decides how to surface
//! a rejection (alarm status, client error, log line).

use std::fmt;

use thiserror::Error;

/// Convenience alias for results using the record error type.
pub type MotorResult<T> = std::result::Result<T, MotorError>;

/// Which soft limit a rejected target violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitBound {
    /// The low limit (LLM).
    Low,
    /// The high limit (HLM).
    High,
}

impl fmt::Display for LimitBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitBound::Low => write!(f, "low"),
            LimitBound::High => write!(f, "high"),
        }
    }
}

/// Reasons a motor-record field write can be refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotorError {
    #[error("motor resolution must be nonzero")]
    InvalidResolution,

    #[error("motor velocity must be positive, got {0} steps/s")]
    InvalidVelocity(f64),

    #[error("value must be finite, got {0}")]
    NonFiniteValue(f64),

    #[error("target {target} violates {bound} soft limit ({limit})")]
    LimitViolation {
        /// The requested target, in user units.
        target: f64,
        /// Which bound was violated.
        bound: LimitBound,
        /// The configured limit value, in user units.
        limit: f64,
    },
}
