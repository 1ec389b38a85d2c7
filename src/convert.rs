//! Conversion between engineering units and raw motor steps.
//!
//! The motor record keeps three views of one position: user units (VAL),
//! dial units (DVAL, equal to user units in this record subset) and raw
//! steps (RVAL). The MRES field is the linear scale factor between them:
//!
//! ```text
//! raw = units * resolution        units = raw / resolution
//! ```
//!
//! Both directions are pure functions and fail only when the resolution is
//! zero, which would make the mapping undefined.

use crate::error::{MotorError, MotorResult};

/// Convert a position in engineering units to raw steps.
pub fn to_raw(units: f64, resolution: f64) -> MotorResult<f64> {
    if resolution == 0.0 {
        return Err(MotorError::InvalidResolution);
    }
    Ok(units * resolution)
}

/// Convert a raw step position to engineering units.
pub fn to_units(raw: f64, resolution: f64) -> MotorResult<f64> {
    if resolution == 0.0 {
        return Err(MotorError::InvalidResolution);
    }
    Ok(raw / resolution)
}
