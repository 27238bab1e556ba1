//! # Restbell Core Library
//!
//! Core business logic for Restbell, a workout set/rest interval timer.
//! The CLI binary is a thin layer over this library; a GUI front end would
//! sit on the same surface.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock-based state machine. Remaining time is
//!   always derived from `elapsed + (now - started_at)`, never from counted
//!   ticks, so process suspension is harmless: `reconcile()` catches up any
//!   number of fully-elapsed phases on resume.
//! - **Interval Model**: pure mapping from exercise parameters (sets,
//!   work/rest durations, time-based vs rep-based) to phases and durations.
//! - **Tick Scheduler**: cancelable 1 Hz tokio loop driving `tick()`.
//! - **Side-Effect Dispatcher**: near-expiry cue and local-notification
//!   decisions; failures are logged, never propagated.
//! - **Storage**: SQLite exercise store with timer-progress write-back and
//!   TOML user settings.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: the only mutator of timer state
//! - [`IntervalSpec`]: validated, immutable exercise timing parameters
//! - [`Ticker`]: periodic tick driver
//! - [`Dispatcher`]: side-effect fan-out
//! - [`ExerciseStore`] / [`Config`]: persistence collaborators

pub mod clock;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod interval;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatch::{CueSink, DispatchSettings, Dispatcher, NotificationId, NotificationSink};
pub use error::{ConfigError, CoreError, SpecError, StorageError};
pub use events::{Event, Snapshot};
pub use interval::{IntervalSpec, Phase};
pub use storage::{Config, ExerciseRecord, ExerciseStore, NewExercise};
pub use timer::{AutoBehavior, Ticker, TickerHandle, TimerEngine};
