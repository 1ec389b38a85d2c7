//! Soft travel limit enforcement.
//!
//! A motor record carries an optional low/high travel limit pair (LLM/HLM,
//! in user units) and a SET mode flag. Targets outside an enforced limit are
//! rejected outright: the write is refused and the previous value retained.
//! Unlike range-constrained scalar records, the motor record never clamps a
//! target to the nearest bound.
//!
//! A disabled bound (`None`) never rejects, and SET mode (limit override)
//! bypasses enforcement entirely so positions can be redefined during
//! calibration.

use serde::{Deserialize, Serialize};

use crate::error::{LimitBound, MotorError, MotorResult};

/// Soft travel limits in user units. `None` disables a bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftLimits {
    /// Low travel limit (LLM), user units.
    pub low: Option<f64>,
    /// High travel limit (HLM), user units.
    pub high: Option<f64>,
}

/// Outcome of checking a target against soft limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitCheck {
    /// The target may be forwarded to the motion controller.
    Allowed,
    /// The target violates a bound; the write must be refused.
    Rejected {
        /// Which bound was violated.
        bound: LimitBound,
        /// The configured limit value.
        limit: f64,
    },
}

impl SoftLimits {
    /// Limits with both bounds disabled (no effective bound).
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Check a target position (user units) against the limits.
    ///
    /// When `limit_override` is set the check always allows: SET mode exists
    /// precisely so positions can be redefined outside the travel range.
    /// `low <= high` is not re-validated here; the target is compared against
    /// the pair as stored.
    pub fn check(&self, target: f64, limit_override: bool) -> LimitCheck {
        if limit_override {
            return LimitCheck::Allowed;
        }
        if let Some(low) = self.low {
            if target < low {
                return LimitCheck::Rejected {
                    bound: LimitBound::Low,
                    limit: low,
                };
            }
        }
        if let Some(high) = self.high {
            if target > high {
                return LimitCheck::Rejected {
                    bound: LimitBound::High,
                    limit: high,
                };
            }
        }
        LimitCheck::Allowed
    }

    /// Check a target and map a rejection to a `MotorError` for the caller.
    pub fn enforce(&self, target: f64, limit_override: bool) -> MotorResult<()> {
        match self.check(target, limit_override) {
            LimitCheck::Allowed => Ok(()),
            LimitCheck::Rejected { bound, limit } => Err(MotorError::LimitViolation {
                target,
                bound,
                limit,
            }),
        }
    }
}
