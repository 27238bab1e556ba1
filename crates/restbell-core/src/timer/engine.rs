//! Timer engine implementation.
//!
//! The engine is a wall-clock-based state machine. It owns no thread and
//! reads no clock: every mutator takes an explicit `now_ms`, and remaining
//! time is always recomputed from `elapsed_ms + (now - started_at)` --
//! never from counted ticks. That makes suspension harmless: `reconcile()`
//! replays however much wall time passed and lands on exactly the state
//! continuous foreground ticking would have produced.
//!
//! ## State transitions
//!
//! ```text
//! Paused -> Running        (start)
//! Running -> Paused        (pause, or boundary without auto-continue)
//! Running -> Running       (boundary with auto-continue, same instant)
//! any -> Paused            (reset)
//! Done is terminal until reset.
//! ```
//!
//! Precondition violations (`start()` while running, `reset()` while
//! running, a second `pause()`) are silent no-ops returning `None`; callers
//! are UI code that may issue redundant calls.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::{Event, Snapshot};
use crate::interval::{IntervalSpec, Phase};

/// Auto-continue flags, copied from user settings at engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoBehavior {
    /// Keep running into the Rest phase when a timed Work phase expires.
    pub auto_start_rest_after_set: bool,
    /// Keep running into the Work phase when a Rest phase expires.
    pub auto_start_set_after_rest: bool,
    /// Rewind to the first interval immediately after reaching Done.
    pub auto_reset: bool,
}

impl Default for AutoBehavior {
    fn default() -> Self {
        Self {
            auto_start_rest_after_set: true,
            auto_start_set_after_rest: false,
            auto_reset: false,
        }
    }
}

/// Core timer engine: the only mutator of timer state for one exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    spec: IntervalSpec,
    behavior: AutoBehavior,
    /// 1-based interval unit index; `spec.done_index()` and above is Done.
    current_index: u32,
    /// Time accumulated within the current phase while paused.
    elapsed_ms: u64,
    running: bool,
    /// Wall clock (ms since epoch) of the last start/resume.
    /// Invariant: `running == started_at_ms.is_some()`.
    #[serde(default)]
    started_at_ms: Option<u64>,
    /// Near-expiry cue latch for the current phase instance.
    #[serde(default)]
    cue_fired: bool,
}

impl TimerEngine {
    pub fn new(spec: IntervalSpec, behavior: AutoBehavior) -> Self {
        Self {
            spec,
            behavior,
            current_index: 1,
            elapsed_ms: 0,
            running: false,
            started_at_ms: None,
            cue_fired: false,
        }
    }

    /// Rebuild an engine from persisted progress (paused).
    pub fn with_progress(
        spec: IntervalSpec,
        behavior: AutoBehavior,
        current_index: u32,
        elapsed_ms: u64,
    ) -> Self {
        let mut engine = Self::new(spec, behavior);
        engine.current_index = current_index.clamp(1, engine.spec.done_index());
        engine.elapsed_ms = elapsed_ms.min(engine.current_phase_duration_ms());
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn spec(&self) -> &IntervalSpec {
        &self.spec
    }

    pub fn index(&self) -> u32 {
        self.current_index
    }

    pub fn phase(&self) -> Phase {
        self.spec.phase_at(self.current_index)
    }

    pub fn set_number(&self) -> u32 {
        self.spec.set_number(self.current_index)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    fn current_phase_duration_ms(&self) -> u64 {
        self.spec.phase_duration_ms(self.current_index)
    }

    /// Remaining time in the current phase. For Done this is the
    /// pre-next-exercise delay.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        let run = match self.started_at_ms {
            Some(started) => self.elapsed_ms + now_ms.saturating_sub(started),
            None => self.elapsed_ms,
        };
        self.current_phase_duration_ms().saturating_sub(run)
    }

    /// Read-only view for UI observation.
    pub fn snapshot(&self, now_ms: u64) -> Snapshot {
        Snapshot {
            phase: self.phase(),
            index: self.current_index,
            set_number: self.set_number(),
            total_sets: self.spec.total_sets(),
            remaining_ms: self.remaining_ms(now_ms),
            total_ms: self.current_phase_duration_ms(),
            running: self.running,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// No-op unless paused and not Done. Done never runs; its delay is a
    /// display value consumed by the next-exercise hand-off.
    pub fn start(&mut self, now_ms: u64) -> Option<Event> {
        if self.running || self.phase() == Phase::Done {
            return None;
        }
        self.running = true;
        self.started_at_ms = Some(now_ms);
        Some(Event::TimerStarted {
            index: self.current_index,
            phase: self.phase(),
            set_number: self.set_number(),
            remaining_ms: self.remaining_ms(now_ms),
            at: Utc::now(),
        })
    }

    /// Fold running time into `elapsed_ms` (clamped to the phase duration)
    /// and stop. No-op when already paused.
    pub fn pause(&mut self, now_ms: u64) -> Option<Event> {
        if !self.running {
            return None;
        }
        let started = self.started_at_ms.take().unwrap_or(now_ms);
        let dur = self.current_phase_duration_ms();
        self.elapsed_ms = (self.elapsed_ms + now_ms.saturating_sub(started)).min(dur);
        self.running = false;
        Some(Event::TimerPaused {
            index: self.current_index,
            remaining_ms: dur - self.elapsed_ms,
            at: Utc::now(),
        })
    }

    /// Periodic re-evaluation while running. The 1 Hz cadence is advisory;
    /// any number of fully-elapsed phases is caught up here, each advanced
    /// at its exact boundary timestamp so auto-continue never drifts.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        self.run_to(now_ms, true)
    }

    /// Lifecycle reconciliation after suspension: identical to `tick`
    /// except that near-expiry cues are latched without firing (the cue
    /// was suppressed while backgrounded; a notification substituted).
    pub fn reconcile(&mut self, now_ms: u64) -> Vec<Event> {
        self.run_to(now_ms, false)
    }

    fn run_to(&mut self, now_ms: u64, emit_cue: bool) -> Vec<Event> {
        let mut events = Vec::new();
        while self.running {
            let started = match self.started_at_ms {
                Some(s) => s,
                None => break,
            };
            let dur = self.current_phase_duration_ms();
            let run = self.elapsed_ms + now_ms.saturating_sub(started);
            if run < dur {
                let remaining = dur - run;
                // "Rounds to one second": [500, 1500) ms.
                if !self.cue_fired && (500..1_500).contains(&remaining) {
                    self.cue_fired = true;
                    if emit_cue {
                        events.push(Event::NearExpiry {
                            index: self.current_index,
                            phase: self.phase(),
                            at: Utc::now(),
                        });
                    }
                }
                break;
            }
            let boundary = started + dur.saturating_sub(self.elapsed_ms);
            events.push(self.advance(Some(boundary)));
        }
        events
    }

    /// Manual phase completion: skip the rest of the current block. While
    /// running, the boundary is "now" and auto-continue applies; while
    /// paused it is a plain step, like tapping the next block.
    pub fn complete(&mut self, now_ms: u64) -> Option<Event> {
        if self.phase() == Phase::Done {
            return None;
        }
        let boundary = if self.running { Some(now_ms) } else { None };
        Some(self.advance(boundary))
    }

    /// Tap-to-jump / full reset. No-op while running.
    pub fn reset_to(&mut self, index: u32) -> Option<Event> {
        if self.running {
            return None;
        }
        self.current_index = index.clamp(1, self.spec.done_index());
        self.elapsed_ms = 0;
        self.cue_fired = false;
        self.started_at_ms = None;
        Some(Event::TimerReset { at: Utc::now() })
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.reset_to(1)
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Phase-boundary transition. `boundary_ms` is the wall-clock instant
    /// of the boundary when the timer was running; `None` for a paused
    /// manual step (auto-continue then never applies).
    fn advance(&mut self, boundary_ms: Option<u64>) -> Event {
        let from = self.phase();
        self.current_index = (self.current_index + 1).min(self.spec.done_index());
        self.elapsed_ms = 0;
        self.cue_fired = false;
        let to = self.phase();

        if to == Phase::Done {
            self.running = false;
            self.started_at_ms = None;
            let event = Event::ExerciseDone {
                set_number: self.set_number(),
                time_before_next_secs: self.spec.time_before_next_secs(),
                at: Utc::now(),
            };
            if self.behavior.auto_reset {
                self.current_index = 1;
            }
            return event;
        }

        let auto = boundary_ms.is_some()
            && match (from, to) {
                (Phase::Work, Phase::Rest) => self.behavior.auto_start_rest_after_set,
                (Phase::Rest, Phase::Work) => self.behavior.auto_start_set_after_rest,
                // Rep-based Rest -> Rest: the set in between is user-paced.
                _ => false,
            };
        if auto {
            self.started_at_ms = boundary_ms;
            self.running = true;
        } else {
            self.running = false;
            self.started_at_ms = None;
        }
        Event::PhaseAdvanced {
            index: self.current_index,
            phase: to,
            set_number: self.set_number(),
            auto_started: auto,
            remaining_ms: self.current_phase_duration_ms(),
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(sets: u32, work: u32, rest: u32, before_next: u32) -> IntervalSpec {
        IntervalSpec::timed(sets, work, rest, before_next).unwrap()
    }

    fn behavior(rest_after_set: bool, set_after_rest: bool) -> AutoBehavior {
        AutoBehavior {
            auto_start_rest_after_set: rest_after_set,
            auto_start_set_after_rest: set_after_rest,
            auto_reset: false,
        }
    }

    #[test]
    fn start_pause_accumulates_without_reset() {
        let mut engine = TimerEngine::new(timed(1, 60, 0, 0), behavior(false, false));
        assert!(engine.start(1_000).is_some());
        assert!(engine.pause(11_000).is_some());
        assert_eq!(engine.elapsed_ms(), 10_000);

        assert!(engine.start(50_000).is_some());
        assert!(engine.pause(55_000).is_some());
        assert_eq!(engine.elapsed_ms(), 15_000);
        assert_eq!(engine.remaining_ms(60_000), 45_000);
    }

    #[test]
    fn pause_is_idempotent() {
        let mut engine = TimerEngine::new(timed(1, 60, 0, 0), behavior(false, false));
        engine.start(0);
        assert!(engine.pause(5_000).is_some());
        assert!(engine.pause(9_000).is_none());
        assert_eq!(engine.elapsed_ms(), 5_000);
    }

    #[test]
    fn start_is_guarded_while_running_and_at_done() {
        let mut engine = TimerEngine::new(timed(1, 10, 5, 0), behavior(false, false));
        assert!(engine.start(0).is_some());
        assert!(engine.start(1_000).is_none());
        engine.pause(1_000);

        // Drive to Done.
        engine.reset_to(2);
        engine.start(0);
        engine.tick(5_000);
        assert_eq!(engine.phase(), Phase::Done);
        assert!(engine.start(6_000).is_none());
    }

    #[test]
    fn reset_is_guarded_while_running() {
        let mut engine = TimerEngine::new(timed(2, 10, 5, 0), behavior(false, false));
        engine.start(0);
        assert!(engine.reset().is_none());
        engine.pause(1_000);
        assert!(engine.reset().is_some());
        assert_eq!(engine.index(), 1);
        assert_eq!(engine.elapsed_ms(), 0);
    }

    // Scenario: 3 sets, work 30s, rest 60s, auto rest-after-set only.
    #[test]
    fn work_expiry_auto_continues_into_rest_but_not_back_into_work() {
        let spec = timed(3, 30, 60, 120);
        let mut engine = TimerEngine::new(spec, behavior(true, false));
        engine.start(0);

        // 30s of ticking finishes Work 1 and keeps running through Rest.
        let events = engine.tick(30_000);
        assert!(matches!(
            events.last(),
            Some(Event::PhaseAdvanced {
                index: 2,
                phase: Phase::Rest,
                auto_started: true,
                remaining_ms: 60_000,
                ..
            })
        ));
        assert!(engine.is_running());
        assert_eq!(engine.remaining_ms(30_000), 60_000);

        // 60s later the rest expires; set_after_rest is off, so it stops.
        let events = engine.tick(90_000);
        assert!(matches!(
            events.last(),
            Some(Event::PhaseAdvanced {
                index: 3,
                phase: Phase::Work,
                auto_started: false,
                ..
            })
        ));
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_ms(95_000), 30_000);
    }

    #[test]
    fn single_set_rep_based_is_done_without_any_timed_phase() {
        let spec = IntervalSpec::rep_based(1, 60, 45).unwrap();
        let engine = TimerEngine::new(spec, AutoBehavior::default());
        assert_eq!(engine.phase(), Phase::Done);
        assert_eq!(engine.remaining_ms(0), 45_000);
        let mut engine = engine;
        assert!(engine.start(0).is_none());
    }

    #[test]
    fn near_expiry_cue_fires_exactly_once_per_phase() {
        let mut engine = TimerEngine::new(timed(1, 30, 0, 0), behavior(false, false));
        engine.start(0);

        assert!(engine.tick(28_000).is_empty());
        let events = engine.tick(29_000);
        assert!(matches!(events.as_slice(), [Event::NearExpiry { index: 1, .. }]));
        // Still above zero on later ticks, but latched.
        assert!(engine.tick(29_400).is_empty());
        assert!(engine.tick(29_900).is_empty());
    }

    #[test]
    fn last_rest_advances_to_done_with_time_before_next() {
        let spec = timed(3, 30, 60, 120);
        let mut engine = TimerEngine::new(spec, behavior(false, false));
        engine.reset_to(6); // final Rest
        engine.start(0);
        let events = engine.tick(60_000);
        assert!(matches!(
            events.last(),
            Some(Event::ExerciseDone {
                set_number: 3,
                time_before_next_secs: 120,
                ..
            })
        ));
        assert_eq!(engine.phase(), Phase::Done);
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_ms(61_000), 120_000);
    }

    #[test]
    fn full_chained_run_reaches_done_exactly_once() {
        let spec = timed(2, 10, 5, 30);
        let mut engine = TimerEngine::new(spec, behavior(true, true));
        engine.reset_to(2);
        engine.reset(); // start over from mid-phase position
        engine.start(0);

        // Total timed duration: 10 + 5 + 10 + 5 = 30s, fully auto-chained.
        let mut done = 0;
        let mut now = 0;
        for _ in 0..35 {
            now += 1_000;
            for event in engine.tick(now) {
                if matches!(event, Event::ExerciseDone { .. }) {
                    done += 1;
                }
            }
        }
        assert_eq!(done, 1);
        assert_eq!(engine.phase(), Phase::Done);
    }

    #[test]
    fn reconcile_catches_up_multiple_phases_at_exact_boundaries() {
        let spec = timed(3, 10, 5, 60);
        let mut engine = TimerEngine::new(spec, behavior(true, true));
        engine.start(0);

        // 27s of suspension spans Work1+Rest1+Work2 and lands 2s into Rest2.
        let events = engine.reconcile(27_000);
        assert_eq!(events.len(), 3);
        assert_eq!(engine.index(), 4);
        assert_eq!(engine.phase(), Phase::Rest);
        assert!(engine.is_running());
        assert_eq!(engine.remaining_ms(27_000), 3_000);
        // No cue events during catch-up.
        assert!(!events.iter().any(|e| matches!(e, Event::NearExpiry { .. })));
    }

    #[test]
    fn reconcile_stops_where_continuous_ticking_would_have_stopped() {
        let spec = timed(3, 10, 5, 60);
        let mut engine = TimerEngine::new(spec, behavior(true, false));
        engine.start(0);

        // Work1 chains into Rest1; Rest1 expires at 15s without continuing
        // into Work2, so a 100s gap still ends paused at Work2, untouched.
        let events = engine.reconcile(100_000);
        assert_eq!(events.len(), 2);
        assert_eq!(engine.index(), 3);
        assert_eq!(engine.phase(), Phase::Work);
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_ms(100_000), 10_000);
    }

    #[test]
    fn reconcile_terminates_at_done_across_whole_exercise() {
        let spec = timed(2, 10, 5, 20);
        let mut engine = TimerEngine::new(spec, behavior(true, true));
        engine.start(0);

        let events = engine.reconcile(1_000_000);
        assert!(matches!(events.last(), Some(Event::ExerciseDone { .. })));
        assert_eq!(engine.phase(), Phase::Done);
        assert!(!engine.is_running());
    }

    #[test]
    fn manual_complete_skips_block_and_applies_auto_continue() {
        let spec = timed(2, 30, 60, 0);
        let mut engine = TimerEngine::new(spec, behavior(true, false));
        engine.start(0);
        let event = engine.complete(5_000).unwrap();
        assert!(matches!(
            event,
            Event::PhaseAdvanced {
                index: 2,
                phase: Phase::Rest,
                auto_started: true,
                ..
            }
        ));
        assert!(engine.is_running());
        // Rest runs from the skip instant.
        assert_eq!(engine.remaining_ms(5_000), 60_000);
    }

    #[test]
    fn manual_complete_while_paused_steps_without_starting() {
        let spec = timed(2, 30, 60, 0);
        let mut engine = TimerEngine::new(spec, behavior(true, true));
        let event = engine.complete(0).unwrap();
        assert!(matches!(
            event,
            Event::PhaseAdvanced {
                auto_started: false,
                ..
            }
        ));
        assert!(!engine.is_running());
    }

    #[test]
    fn rep_based_rest_expiry_never_auto_continues() {
        let spec = IntervalSpec::rep_based(3, 10, 0).unwrap();
        let mut engine = TimerEngine::new(spec, behavior(true, true));
        engine.start(0);
        let events = engine.tick(10_000);
        assert!(matches!(
            events.last(),
            Some(Event::PhaseAdvanced {
                index: 2,
                phase: Phase::Rest,
                auto_started: false,
                ..
            })
        ));
        assert!(!engine.is_running());
    }

    #[test]
    fn auto_reset_rewinds_after_done() {
        let spec = timed(1, 10, 5, 0);
        let behavior = AutoBehavior {
            auto_start_rest_after_set: true,
            auto_start_set_after_rest: true,
            auto_reset: true,
        };
        let mut engine = TimerEngine::new(spec, behavior);
        engine.start(0);
        let events = engine.tick(15_000);
        assert!(matches!(events.last(), Some(Event::ExerciseDone { .. })));
        assert_eq!(engine.index(), 1);
        assert_eq!(engine.phase(), Phase::Work);
        assert!(!engine.is_running());
    }

    #[test]
    fn with_progress_clamps_to_valid_range() {
        let spec = timed(2, 10, 5, 0);
        let engine =
            TimerEngine::with_progress(spec.clone(), AutoBehavior::default(), 99, 999_999);
        assert_eq!(engine.index(), spec.done_index());

        let engine = TimerEngine::with_progress(spec, AutoBehavior::default(), 2, 2_000);
        assert_eq!(engine.index(), 2);
        assert_eq!(engine.elapsed_ms(), 2_000);
    }

    #[test]
    fn engine_survives_serde_round_trip_while_running() {
        let spec = timed(2, 30, 60, 0);
        let mut engine = TimerEngine::new(spec, AutoBehavior::default());
        engine.start(1_000);
        let json = serde_json::to_string(&engine).unwrap();
        let mut restored: TimerEngine = serde_json::from_str(&json).unwrap();
        assert!(restored.is_running());
        // Reconciling the restored engine picks up where the wall clock is.
        restored.reconcile(31_000);
        assert_eq!(restored.index(), 2);
    }
}
