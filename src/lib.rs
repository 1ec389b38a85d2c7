//! # motorsim
//!
//! A simulated EPICS-style motor record for instrument-control software.
//!
//! The crate emulates the motor-field subset of the EPICS motor record: one
//! positioning axis represented as a set of named, observable fields (user,
//! dial and raw position, resolution, velocity, soft limits, moving/done
//! status) that are kept mutually consistent by a synchronizing core, with
//! realistic velocity-driven timed motion instead of a real controller.
//! Operator screens and scan engines interact with the axis purely through
//! the field set.
//!
//! ## Crate Structure
//!
//! - **`config`**: `MotorConfig`, the one-shot construction parameters for an
//!   axis, serde-deserializable with a semantic `validate()` pass.
//! - **`convert`**: pure conversion between engineering units and raw motor
//!   steps through the resolution factor.
//! - **`error`**: the `MotorError` taxonomy for rejected writes.
//! - **`field`**: `Field<T>`, a typed observable value over a watch channel
//!   with per-field metadata and multi-subscriber change notification.
//! - **`limits`**: soft travel limit enforcement with SET-mode override.
//! - **`motion`**: the Idle/Moving state machine, move planning and linear
//!   interpolation of in-flight position.
//! - **`record`**: `MotorRecord`, the field synchronizer that owns the
//!   canonical state, serializes writes against readback ticks, and drives
//!   the periodic readback loop.
//!
//! ## Example
//!
//! ```rust,ignore
//! use motorsim::{MotorConfig, MotorRecord};
//!
//! let config = MotorConfig::new("m1").with_resolution(2.0).with_velocity(10.0);
//! let record = MotorRecord::new(&config)?;
//!
//! let mut done = record.fields().done.subscribe();
//! record.write_user(5.0).await?;          // raw target 10, takes 1 s
//! while !*done.borrow_and_update() {
//!     done.changed().await?;
//! }
//! assert_eq!(record.fields().raw_position.get(), 10.0);
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod field;
pub mod limits;
pub mod motion;
pub mod record;

pub use config::MotorConfig;
pub use error::{LimitBound, MotorError, MotorResult};
pub use field::Field;
pub use limits::{LimitCheck, SoftLimits};
pub use record::{MotorRecord, MotorSnapshot, READBACK_INTERVAL};
