//! Interval model: pure mapping from an exercise's timing parameters to
//! phases and durations.
//!
//! An exercise is a sequence of interval units addressed by a 1-based
//! `index`. Time-based exercises alternate Work/Rest (`2 * total_sets`
//! units, odd = Work, even = Rest). Rep-based sets are user-paced and have
//! no timed Work unit: index `i` is the rest that follows set `i`, and the
//! final set has no trailing rest, so the Done region starts at
//! `total_sets`. A single-set rep-based exercise is therefore Done from the
//! start, with no timed phase ever entered.
//!
//! The Done phase's displayed duration is always `time_before_next_secs`,
//! the delay before the next exercise.

use serde::{Deserialize, Serialize};

use crate::error::SpecError;

/// Which kind of interval unit the timer is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Rest,
    Done,
}

/// Immutable timing parameters for one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSpec {
    total_sets: u32,
    time_based: bool,
    work_secs: u32,
    rest_secs: u32,
    time_before_next_secs: u32,
}

impl IntervalSpec {
    /// Validate and build a spec. Zero rest and zero time-before-next are
    /// legal; a zero work duration on a time-based exercise is not.
    pub fn new(
        total_sets: u32,
        time_based: bool,
        work_secs: u32,
        rest_secs: u32,
        time_before_next_secs: u32,
    ) -> Result<Self, SpecError> {
        if total_sets < 1 {
            return Err(SpecError::InvalidSetCount(total_sets));
        }
        if time_based && work_secs < 1 {
            return Err(SpecError::InvalidWorkDuration(work_secs));
        }
        Ok(Self {
            total_sets,
            time_based,
            work_secs,
            rest_secs,
            time_before_next_secs,
        })
    }

    /// Timed exercise: every set is a fixed `work_secs` interval.
    pub fn timed(
        total_sets: u32,
        work_secs: u32,
        rest_secs: u32,
        time_before_next_secs: u32,
    ) -> Result<Self, SpecError> {
        Self::new(total_sets, true, work_secs, rest_secs, time_before_next_secs)
    }

    /// Rep-based exercise: sets are user-paced, only rests are timed.
    pub fn rep_based(
        total_sets: u32,
        rest_secs: u32,
        time_before_next_secs: u32,
    ) -> Result<Self, SpecError> {
        Self::new(total_sets, false, 0, rest_secs, time_before_next_secs)
    }

    pub fn total_sets(&self) -> u32 {
        self.total_sets
    }

    pub fn is_time_based(&self) -> bool {
        self.time_based
    }

    pub fn work_secs(&self) -> u32 {
        self.work_secs
    }

    pub fn rest_secs(&self) -> u32 {
        self.rest_secs
    }

    pub fn time_before_next_secs(&self) -> u32 {
        self.time_before_next_secs
    }

    /// Number of interval units: Work+Rest pairs when timed, one rest slot
    /// per set otherwise.
    pub fn interval_count(&self) -> u32 {
        if self.time_based {
            self.total_sets * 2
        } else {
            self.total_sets
        }
    }

    /// First index that means "exercise done".
    ///
    /// Rep-based exercises have no rest after the final set, so their Done
    /// region starts one unit early, at `total_sets`.
    pub fn done_index(&self) -> u32 {
        if self.time_based {
            self.interval_count() + 1
        } else {
            self.total_sets
        }
    }

    pub fn phase_at(&self, index: u32) -> Phase {
        if index >= self.done_index() {
            Phase::Done
        } else if self.time_based && index % 2 == 1 {
            Phase::Work
        } else {
            Phase::Rest
        }
    }

    /// Duration of the unit at `index` in milliseconds.
    pub fn phase_duration_ms(&self, index: u32) -> u64 {
        let secs = match self.phase_at(index) {
            Phase::Work => self.work_secs,
            Phase::Rest => self.rest_secs,
            Phase::Done => self.time_before_next_secs,
        };
        u64::from(secs) * 1_000
    }

    /// 1-based set number the user is on at `index`, for display and for
    /// the persisted `current_set` write-back.
    pub fn set_number(&self, index: u32) -> u32 {
        let set = if self.time_based {
            index.div_ceil(2)
        } else {
            index.max(1)
        };
        set.min(self.total_sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_spec_alternates_work_rest() {
        let spec = IntervalSpec::timed(3, 30, 60, 120).unwrap();
        assert_eq!(spec.interval_count(), 6);
        assert_eq!(spec.done_index(), 7);
        assert_eq!(spec.phase_at(1), Phase::Work);
        assert_eq!(spec.phase_at(2), Phase::Rest);
        assert_eq!(spec.phase_at(5), Phase::Work);
        assert_eq!(spec.phase_at(6), Phase::Rest);
        assert_eq!(spec.phase_at(7), Phase::Done);
        assert_eq!(spec.phase_duration_ms(1), 30_000);
        assert_eq!(spec.phase_duration_ms(2), 60_000);
        assert_eq!(spec.phase_duration_ms(7), 120_000);
    }

    #[test]
    fn rep_based_spec_has_rests_between_sets_only() {
        let spec = IntervalSpec::rep_based(3, 90, 45).unwrap();
        assert_eq!(spec.interval_count(), 3);
        assert_eq!(spec.done_index(), 3);
        assert_eq!(spec.phase_at(1), Phase::Rest);
        assert_eq!(spec.phase_at(2), Phase::Rest);
        assert_eq!(spec.phase_at(3), Phase::Done);
        assert_eq!(spec.phase_duration_ms(2), 90_000);
        assert_eq!(spec.phase_duration_ms(3), 45_000);
    }

    #[test]
    fn single_set_rep_based_is_done_immediately() {
        let spec = IntervalSpec::rep_based(1, 60, 30).unwrap();
        assert_eq!(spec.done_index(), 1);
        assert_eq!(spec.phase_at(1), Phase::Done);
        assert_eq!(spec.phase_duration_ms(1), 30_000);
    }

    #[test]
    fn set_numbers_track_index() {
        let timed = IntervalSpec::timed(3, 30, 60, 0).unwrap();
        assert_eq!(timed.set_number(1), 1);
        assert_eq!(timed.set_number(2), 1);
        assert_eq!(timed.set_number(3), 2);
        assert_eq!(timed.set_number(6), 3);
        assert_eq!(timed.set_number(7), 3);

        let reps = IntervalSpec::rep_based(4, 90, 0).unwrap();
        assert_eq!(reps.set_number(1), 1);
        assert_eq!(reps.set_number(3), 3);
        assert_eq!(reps.set_number(4), 4);
        assert_eq!(reps.set_number(9), 4);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert_eq!(
            IntervalSpec::rep_based(0, 60, 0).unwrap_err(),
            SpecError::InvalidSetCount(0)
        );
        assert_eq!(
            IntervalSpec::timed(3, 0, 60, 0).unwrap_err(),
            SpecError::InvalidWorkDuration(0)
        );
        // Zero rest is legal.
        assert!(IntervalSpec::timed(3, 30, 0, 0).is_ok());
    }
}
