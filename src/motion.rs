//! Simulated motion state machine.
//!
//! An axis is either `Idle` (done moving) or `Moving` with a set of
//! transient move parameters: where the move started, where it is headed,
//! when it began and how long it takes at the configured velocity. Position
//! during a move is linear interpolation between start and target.
//!
//! There is no move queue. A new target accepted while moving *retargets*:
//! the prior target is discarded and a fresh plan is computed from the
//! current interpolated position, so the simulated axis never jumps.
//!
//! Uses `tokio::time::Instant` so simulated time can be paused and advanced
//! deterministically in tests.

use tokio::time::Instant;

use crate::error::{MotorError, MotorResult};

/// Raw-step distance below which a target is treated as "already there".
///
/// Guards against spurious no-op moves from repeated writes of the same
/// setpoint; a target within this distance of the current position never
/// leaves `Idle`.
pub const POSITION_EPSILON: f64 = 1e-9;

/// Transient parameters of an in-flight move. Exist only while `Moving`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveParams {
    /// When the move (or the latest retarget) began.
    pub start_time: Instant,
    /// Raw position at `start_time`.
    pub start_raw: f64,
    /// Raw position the move is heading to.
    pub target_raw: f64,
    /// Total travel time in seconds at the planned velocity.
    pub duration_s: f64,
}

impl MoveParams {
    /// Plan a move from `start_raw` to `target_raw` at `velocity` steps/s.
    ///
    /// Fails with `InvalidVelocity` when the velocity is not positive; the
    /// axis stays idle and the write is rejected.
    pub fn plan(
        start_raw: f64,
        target_raw: f64,
        velocity: f64,
        now: Instant,
    ) -> MotorResult<Self> {
        if velocity <= 0.0 {
            return Err(MotorError::InvalidVelocity(velocity));
        }
        Ok(Self {
            start_time: now,
            start_raw,
            target_raw,
            duration_s: (target_raw - start_raw).abs() / velocity,
        })
    }

    /// Fraction of the move completed at `now`, clamped to `[0, 1]`.
    pub fn fraction(&self, now: Instant) -> f64 {
        if self.duration_s <= 0.0 {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start_time).as_secs_f64();
        (elapsed / self.duration_s).clamp(0.0, 1.0)
    }

    /// Interpolated raw position at `now`.
    pub fn interpolate(&self, now: Instant) -> f64 {
        self.start_raw + (self.target_raw - self.start_raw) * self.fraction(now)
    }

    /// Whether the planned travel time has elapsed at `now`.
    pub fn is_complete(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start_time).as_secs_f64() >= self.duration_s
    }
}

/// Axis motion state: `Idle` (done=true) or `Moving` (done=false).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MotionState {
    /// Settled; no move parameters exist.
    #[default]
    Idle,
    /// In flight with the given transient parameters.
    Moving(MoveParams),
}

impl MotionState {
    /// Whether the axis is currently moving.
    pub fn is_moving(&self) -> bool {
        matches!(self, MotionState::Moving(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_plan_duration() {
        let now = Instant::now();
        let params = MoveParams::plan(0.0, 50.0, 5.0, now).unwrap();
        assert_eq!(params.duration_s, 10.0);

        // Direction does not matter for duration.
        let back = MoveParams::plan(50.0, 0.0, 5.0, now).unwrap();
        assert_eq!(back.duration_s, 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_plan_rejects_bad_velocity() {
        let now = Instant::now();
        assert_eq!(
            MoveParams::plan(0.0, 10.0, 0.0, now),
            Err(MotorError::InvalidVelocity(0.0))
        );
        assert_eq!(
            MoveParams::plan(0.0, 10.0, -5.0, now),
            Err(MotorError::InvalidVelocity(-5.0))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_interpolation() {
        let start = Instant::now();
        let params = MoveParams::plan(0.0, 50.0, 5.0, start).unwrap();

        assert_eq!(params.interpolate(start), 0.0);
        assert!(!params.is_complete(start));

        let halfway = start + Duration::from_secs(5);
        assert!((params.interpolate(halfway) - 25.0).abs() < 1e-9);

        let done = start + Duration::from_secs(10);
        assert_eq!(params.interpolate(done), 50.0);
        assert!(params.is_complete(done));

        // Past the end the fraction clamps; no overshoot.
        let late = start + Duration::from_secs(15);
        assert_eq!(params.interpolate(late), 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retarget_plans_from_interpolated_position() {
        let start = Instant::now();
        let params = MoveParams::plan(0.0, 100.0, 5.0, start).unwrap();

        // Retarget at t=5s: interpolated position is 25, new target 0.
        let at = start + Duration::from_secs(5);
        let current = params.interpolate(at);
        assert!((current - 25.0).abs() < 1e-9);

        let replanned = MoveParams::plan(current, 0.0, 5.0, at).unwrap();
        assert!((replanned.duration_s - 5.0).abs() < 1e-9);
        assert_eq!(replanned.target_raw, 0.0);
    }

    #[test]
    fn test_default_state_is_idle() {
        assert!(!MotionState::default().is_moving());
    }
}
