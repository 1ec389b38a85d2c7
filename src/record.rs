//! The motor record core: field synchronization and simulated motion.
//!
//! `MotorRecord` is the single entry point for all field writes and the only
//! component that mutates the canonical axis state. On any write to a
//! position field (VAL, DVAL or RVAL) it normalizes the target to raw steps,
//! runs soft-limit enforcement, and hands the target to the motion state
//! machine; a background readback task then publishes interpolated positions
//! every 100 ms until the move settles.
//!
//! # Field set
//!
//! | Field | Meaning                          | Type          |
//! |-------|----------------------------------|---------------|
//! | VAL   | user position setpoint/readback  | `f64`         |
//! | DVAL  | dial position (== VAL here)      | `f64`         |
//! | RVAL  | raw step position                | `f64`         |
//! | MRES  | steps per user unit              | `f64`         |
//! | VELO  | velocity, steps/s                | `f64`         |
//! | PREC  | display precision                | `u32`         |
//! | LLM   | low soft limit                   | `Option<f64>` |
//! | HLM   | high soft limit                  | `Option<f64>` |
//! | SET   | limit-override / calibration mode| `bool`        |
//! | DMOV  | done moving                      | `bool`        |
//! | MOVN  | moving now                       | `bool`        |
//!
//! # Concurrency
//!
//! One `tokio::sync::Mutex` per axis serializes every read-compute-publish
//! sequence: client writes, readback ticks and move completion all run inside
//! the same critical section, so a retarget during a tick is always visible
//! to the next tick and a tick can never overwrite a newer target. Separate
//! axes are fully independent.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info};

use crate::config::MotorConfig;
use crate::convert;
use crate::error::{MotorError, MotorResult};
use crate::field::Field;
use crate::limits::SoftLimits;
use crate::motion::{MotionState, MoveParams, POSITION_EPSILON};

/// Cadence of interpolated readback publications while a move is in flight.
pub const READBACK_INTERVAL: Duration = Duration::from_millis(100);

/// Reject NaN and infinite inputs at the write boundary.
///
/// A non-finite value would poison every downstream computation (limit
/// comparisons are vacuously false for NaN and a planned duration of NaN
/// never reads as complete), so no field write accepts one.
fn ensure_finite(value: f64) -> MotorResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MotorError::NonFiniteValue(value))
    }
}

/// The published field set of one motor record.
///
/// Every field is an observable view computed from the canonical state; none
/// holds independent truth. Hosting code reads and subscribes here, and
/// writes through the [`MotorRecord`] methods.
#[derive(Debug)]
pub struct MotorFields {
    /// VAL: position setpoint/readback in user units.
    pub user_position: Field<f64>,
    /// DVAL: dial position; identical to VAL in this record subset.
    pub dial_position: Field<f64>,
    /// RVAL: raw step position. Lags VAL/DVAL until a move completes.
    pub raw_position: Field<f64>,
    /// MRES: steps per user unit.
    pub resolution: Field<f64>,
    /// VELO: move velocity in steps/s.
    pub velocity: Field<f64>,
    /// PREC: display precision in decimal places.
    pub precision: Field<u32>,
    /// LLM: low soft limit, user units.
    pub low_limit: Field<Option<f64>>,
    /// HLM: high soft limit, user units.
    pub high_limit: Field<Option<f64>>,
    /// SET: limit-override mode; position writes redefine instead of move.
    pub limit_override: Field<bool>,
    /// DMOV: done moving.
    pub done: Field<bool>,
    /// MOVN: moving now. Always the complement of DMOV.
    pub moving: Field<bool>,
}

/// Canonical per-axis state, guarded by the record mutex.
#[derive(Debug)]
struct MotorState {
    raw: f64,
    resolution: f64,
    velocity: f64,
    precision: u32,
    limits: SoftLimits,
    limit_override: bool,
    motion: MotionState,
    /// Readback ticker for the move in flight. Aborted when a SET-mode
    /// redefinition cancels the move; cleared when the ticker completes.
    ticker: Option<JoinHandle<()>>,
}

/// Serializable view of all field values at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorSnapshot {
    /// Record name.
    pub name: String,
    /// VAL.
    pub user_position: f64,
    /// DVAL.
    pub dial_position: f64,
    /// RVAL.
    pub raw_position: f64,
    /// MRES.
    pub resolution: f64,
    /// VELO.
    pub velocity: f64,
    /// PREC.
    pub precision: u32,
    /// LLM.
    pub low_limit: Option<f64>,
    /// HLM.
    pub high_limit: Option<f64>,
    /// SET.
    pub limit_override: bool,
    /// MOVN.
    pub moving: bool,
    /// DMOV.
    pub done: bool,
}

/// One simulated motor axis.
///
/// Cheap to clone; clones share the same axis. Dropping every clone abandons
/// any in-flight readback ticker, which is the intended shutdown behavior
/// (no persistence, no resume).
#[derive(Debug, Clone)]
pub struct MotorRecord {
    name: Arc<str>,
    state: Arc<Mutex<MotorState>>,
    fields: Arc<MotorFields>,
}

impl MotorRecord {
    /// Build a record from its construction-time configuration.
    ///
    /// Fails when the configured resolution is zero or the velocity is not
    /// positive.
    pub fn new(config: &MotorConfig) -> MotorResult<Self> {
        config.validate()?;
        let raw = convert::to_raw(config.start_position, config.resolution)?;

        let fields = MotorFields {
            user_position: Field::new("VAL", config.start_position),
            dial_position: Field::new("DVAL", config.start_position),
            raw_position: Field::new("RVAL", raw).with_unit("steps"),
            resolution: Field::new("MRES", config.resolution).with_unit("steps/unit"),
            velocity: Field::new("VELO", config.velocity).with_unit("steps/s"),
            precision: Field::new("PREC", config.precision),
            low_limit: Field::new("LLM", config.low_limit),
            high_limit: Field::new("HLM", config.high_limit),
            limit_override: Field::new("SET", false),
            done: Field::new("DMOV", true),
            moving: Field::new("MOVN", false),
        };

        let state = MotorState {
            raw,
            resolution: config.resolution,
            velocity: config.velocity,
            precision: config.precision,
            limits: config.soft_limits(),
            limit_override: false,
            motion: MotionState::Idle,
            ticker: None,
        };

        Ok(Self {
            name: config.name.as_str().into(),
            state: Arc::new(Mutex::new(state)),
            fields: Arc::new(fields),
        })
    }

    /// Record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The published field set, for reading and subscribing.
    pub fn fields(&self) -> &MotorFields {
        &self.fields
    }

    /// Whether a move is currently in flight.
    pub async fn is_moving(&self) -> bool {
        self.state.lock().await.motion.is_moving()
    }

    /// Coherent snapshot of all field values, taken under the axis lock.
    pub async fn snapshot(&self) -> MotorSnapshot {
        let state = self.state.lock().await;
        MotorSnapshot {
            name: self.name.to_string(),
            user_position: self.fields.user_position.get(),
            dial_position: self.fields.dial_position.get(),
            raw_position: self.fields.raw_position.get(),
            resolution: state.resolution,
            velocity: state.velocity,
            precision: state.precision,
            low_limit: state.limits.low,
            high_limit: state.limits.high,
            limit_override: state.limit_override,
            moving: state.motion.is_moving(),
            done: !state.motion.is_moving(),
        }
    }

    // -------------------------------------------------------------------------
    // Position writes
    // -------------------------------------------------------------------------

    /// Write the user position setpoint (VAL).
    ///
    /// Validates against the soft limits (user units), converts to raw steps
    /// and starts or retargets a move. The setpoint is visible in VAL/DVAL
    /// as soon as the write is accepted; RVAL follows via readback ticks. In
    /// SET mode the position is redefined without any simulated travel.
    /// Non-finite targets are rejected.
    pub async fn write_user(&self, target: f64) -> MotorResult<()> {
        ensure_finite(target)?;
        let mut state = self.state.lock().await;
        let raw = convert::to_raw(target, state.resolution)?;
        if state.limit_override {
            self.redefine(&mut state, raw, target);
            return Ok(());
        }
        state.limits.enforce(target, false)?;
        self.request_move(&mut state, raw)?;
        self.fields.user_position.publish(target);
        self.fields.dial_position.publish(target);
        Ok(())
    }

    /// Write the dial position setpoint (DVAL).
    ///
    /// Dial and user coordinates are defined equal in this record subset
    /// (offset/direction fields are unused), so this is the same operation
    /// as [`write_user`](Self::write_user).
    pub async fn write_dial(&self, target: f64) -> MotorResult<()> {
        self.write_user(target).await
    }

    /// Write the raw step position (RVAL).
    ///
    /// The target is converted to user units for limit enforcement, then
    /// follows the same move path as a VAL write.
    pub async fn write_raw(&self, target_raw: f64) -> MotorResult<()> {
        ensure_finite(target_raw)?;
        let mut state = self.state.lock().await;
        let units = convert::to_units(target_raw, state.resolution)?;
        if state.limit_override {
            self.redefine(&mut state, target_raw, units);
            return Ok(());
        }
        state.limits.enforce(units, false)?;
        self.request_move(&mut state, target_raw)?;
        self.fields.user_position.publish(units);
        self.fields.dial_position.publish(units);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Configuration writes
    // -------------------------------------------------------------------------

    /// Write the resolution (MRES, steps per user unit). Rejects zero and
    /// non-finite values.
    ///
    /// A resolution change does not rescale an in-flight move; the raw
    /// trajectory already planned runs to completion and the new value
    /// applies to subsequent moves only.
    pub async fn write_resolution(&self, resolution: f64) -> MotorResult<()> {
        ensure_finite(resolution)?;
        if resolution == 0.0 {
            return Err(MotorError::InvalidResolution);
        }
        let mut state = self.state.lock().await;
        state.resolution = resolution;
        self.fields.resolution.publish(resolution);
        Ok(())
    }

    /// Write the velocity (VELO, steps/s).
    ///
    /// Non-finite values are rejected; a non-positive velocity is stored
    /// as-is and only rejected when the next move is requested.
    pub async fn write_velocity(&self, velocity: f64) -> MotorResult<()> {
        ensure_finite(velocity)?;
        let mut state = self.state.lock().await;
        state.velocity = velocity;
        self.fields.velocity.publish(velocity);
        Ok(())
    }

    /// Write the display precision (PREC).
    pub async fn write_precision(&self, precision: u32) -> MotorResult<()> {
        let mut state = self.state.lock().await;
        state.precision = precision;
        self.fields.precision.publish(precision);
        Ok(())
    }

    /// Write the low soft limit (LLM). `None` disables the bound.
    pub async fn write_low_limit(&self, limit: Option<f64>) -> MotorResult<()> {
        if let Some(value) = limit {
            ensure_finite(value)?;
        }
        let mut state = self.state.lock().await;
        state.limits.low = limit;
        self.fields.low_limit.publish(limit);
        Ok(())
    }

    /// Write the high soft limit (HLM). `None` disables the bound.
    pub async fn write_high_limit(&self, limit: Option<f64>) -> MotorResult<()> {
        if let Some(value) = limit {
            ensure_finite(value)?;
        }
        let mut state = self.state.lock().await;
        state.limits.high = limit;
        self.fields.high_limit.publish(limit);
        Ok(())
    }

    /// Write the limit-override mode (SET).
    ///
    /// While set, position writes redefine the position fields without
    /// simulated travel and bypass soft-limit checks.
    pub async fn write_limit_override(&self, enabled: bool) -> MotorResult<()> {
        let mut state = self.state.lock().await;
        state.limit_override = enabled;
        self.fields.limit_override.publish(enabled);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Motion
    // -------------------------------------------------------------------------

    /// Redefine the position fields without travel (SET mode write).
    ///
    /// Any in-flight move is cancelled and its ticker aborted. The ticker
    /// cannot be mid-publication here: it only touches state under the axis
    /// lock, which the caller holds.
    fn redefine(&self, state: &mut MotorState, raw: f64, units: f64) {
        state.raw = raw;
        if state.motion.is_moving() {
            state.motion = MotionState::Idle;
            if let Some(ticker) = state.ticker.take() {
                ticker.abort();
            }
        }
        self.fields.raw_position.publish(raw);
        self.fields.dial_position.publish(units);
        self.fields.user_position.publish(units);
        self.fields.moving.publish(false);
        self.fields.done.publish(true);
        debug!(motor = %self.name, raw, units, "position redefined (SET mode)");
    }

    /// Start a move toward `target_raw`, or retarget the one in flight.
    ///
    /// Caller holds the state lock. A target within [`POSITION_EPSILON`] of
    /// the settled position is a no-op and the axis stays idle.
    fn request_move(&self, state: &mut MotorState, target_raw: f64) -> MotorResult<()> {
        let now = Instant::now();
        match state.motion {
            MotionState::Moving(params) => {
                // Retarget: replan from the current interpolated position so
                // the simulated axis never jumps.
                let current = params.interpolate(now);
                let plan = MoveParams::plan(current, target_raw, state.velocity, now)?;
                debug!(
                    motor = %self.name,
                    from = current,
                    target = target_raw,
                    duration_s = plan.duration_s,
                    "retargeting move"
                );
                state.motion = MotionState::Moving(plan);
                Ok(())
            }
            MotionState::Idle => {
                if (target_raw - state.raw).abs() <= POSITION_EPSILON {
                    return Ok(());
                }
                let plan = MoveParams::plan(state.raw, target_raw, state.velocity, now)?;
                info!(
                    motor = %self.name,
                    from = state.raw,
                    target = target_raw,
                    duration_s = plan.duration_s,
                    "starting move"
                );
                state.motion = MotionState::Moving(plan);
                self.fields.done.publish(false);
                self.fields.moving.publish(true);

                let record = self.clone();
                state.ticker = Some(tokio::spawn(async move {
                    record.run_readback().await;
                }));
                Ok(())
            }
        }
    }

    /// Readback loop for one move session.
    ///
    /// Ticks every [`READBACK_INTERVAL`], publishing the interpolated
    /// position, and terminates on the tick that observes the move complete
    /// (publishing the exact final position instead of an interpolation).
    /// A SET-mode redefinition aborts the task outright.
    async fn run_readback(self) {
        let mut ticks = time::interval_at(Instant::now() + READBACK_INTERVAL, READBACK_INTERVAL);
        loop {
            ticks.tick().await;
            let mut state = self.state.lock().await;
            let params = match state.motion {
                MotionState::Moving(params) => params,
                MotionState::Idle => break,
            };

            let now = Instant::now();
            if params.is_complete(now) {
                state.raw = params.target_raw;
                state.motion = MotionState::Idle;
                state.ticker = None;
                self.publish_position(&state);
                self.fields.moving.publish(false);
                self.fields.done.publish(true);
                info!(motor = %self.name, raw = state.raw, "move complete");
                break;
            }

            let raw = params.interpolate(now);
            match convert::to_units(raw, state.resolution) {
                Ok(units) => {
                    self.fields.raw_position.publish(raw);
                    self.fields.dial_position.publish(units);
                    self.fields.user_position.publish(units);
                }
                Err(err) => {
                    error!(motor = %self.name, %err, "readback conversion failed");
                }
            }
        }
    }

    /// Publish the settled position to all three position fields.
    fn publish_position(&self, state: &MotorState) {
        self.fields.raw_position.publish(state.raw);
        match convert::to_units(state.raw, state.resolution) {
            Ok(units) => {
                self.fields.dial_position.publish(units);
                self.fields.user_position.publish(units);
            }
            Err(err) => {
                error!(motor = %self.name, %err, "position conversion failed");
            }
        }
    }
}
