use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::Phase;

/// Every timer state change produces an Event.
/// The side-effect dispatcher consumes them; front ends may also observe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        index: u32,
        phase: Phase,
        set_number: u32,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        index: u32,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Remaining time first rounded to one second; fired once per phase
    /// instance.
    NearExpiry {
        index: u32,
        phase: Phase,
        at: DateTime<Utc>,
    },
    /// Crossed a phase boundary (tick expiry or manual completion).
    PhaseAdvanced {
        index: u32,
        phase: Phase,
        set_number: u32,
        /// True when auto-continue kept the timer running through the
        /// boundary; `remaining_ms` is then the new phase's remaining time.
        auto_started: bool,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// All sets finished; the exercise is in its pre-next-exercise delay.
    ExerciseDone {
        set_number: u32,
        time_before_next_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
}

/// Read-only view of the engine for UI observation. Observation never
/// mutates timer state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub index: u32,
    pub set_number: u32,
    pub total_sets: u32,
    pub remaining_ms: u64,
    pub total_ms: u64,
    pub running: bool,
}
