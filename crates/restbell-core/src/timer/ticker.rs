//! Tick scheduler: drives `tick()` at 1 Hz while the engine runs.
//!
//! The cadence is advisory -- correctness comes from the engine recomputing
//! remaining time from the wall clock on every tick, so a missed or late
//! tick changes nothing. The loop runs on the tokio runtime, away from any
//! UI path, and stops itself as soon as the engine reports not-running.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::events::Event;
use crate::timer::TimerEngine;

pub struct Ticker;

/// Handle to a running tick loop. Dropping it leaves the loop running
/// until the engine pauses; call [`TickerHandle::stop`] to cancel.
pub struct TickerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Ticker {
    /// Spawn the 1 Hz loop. Engine events are forwarded to `events`;
    /// the engine mutex is the single-writer gate shared with command
    /// handlers.
    pub fn spawn(
        engine: Arc<Mutex<TimerEngine>>,
        clock: Arc<dyn Clock>,
        events: mpsc::UnboundedSender<Event>,
    ) -> TickerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = interval.tick() => {
                        let now = clock.now_ms();
                        let (ticked, still_running) = {
                            let Ok(mut engine) = engine.lock() else { break };
                            (engine.tick(now), engine.is_running())
                        };
                        for event in ticked {
                            if events.send(event).is_err() {
                                tracing::warn!("tick event receiver dropped");
                                return;
                            }
                        }
                        if !still_running {
                            break;
                        }
                    }
                }
            }
        });
        TickerHandle { stop_tx, task }
    }
}

impl TickerHandle {
    /// Cancel the loop and wait for it to finish. After this returns, no
    /// tick can mutate the engine.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to end on its own (engine no longer running).
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::interval::IntervalSpec;
    use crate::timer::AutoBehavior;

    fn running_engine(work_secs: u32, now_ms: u64) -> TimerEngine {
        let spec = IntervalSpec::timed(1, work_secs, 5, 0).unwrap();
        let no_auto = AutoBehavior {
            auto_start_rest_after_set: false,
            auto_start_set_after_rest: false,
            auto_reset: false,
        };
        let mut engine = TimerEngine::new(spec, no_auto);
        engine.start(now_ms);
        engine
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_advances_engine_and_forwards_events() {
        let clock = Arc::new(ManualClock::new(0));
        let engine = Arc::new(Mutex::new(running_engine(2, 0)));
        let (tx, mut rx) = mpsc::unbounded_channel();

        clock.advance(2_500);
        let handle = Ticker::spawn(engine.clone(), clock.clone(), tx);

        let event = rx.recv().await.expect("boundary event");
        assert!(matches!(event, Event::PhaseAdvanced { index: 2, .. }));
        handle.join().await;
        assert!(!engine.lock().unwrap().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_exits_when_engine_is_not_running() {
        let clock = Arc::new(ManualClock::new(0));
        let spec = IntervalSpec::timed(1, 30, 5, 0).unwrap();
        let engine = Arc::new(Mutex::new(TimerEngine::new(spec, AutoBehavior::default())));
        let (tx, _rx) = mpsc::unbounded_channel();

        let handle = Ticker::spawn(engine, clock, tx);
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_before_boundary() {
        let clock = Arc::new(ManualClock::new(0));
        let engine = Arc::new(Mutex::new(running_engine(30, 0)));
        let (tx, _rx) = mpsc::unbounded_channel();

        let handle = Ticker::spawn(engine.clone(), clock, tx);
        handle.stop().await;
        // Engine untouched: still running, no phase crossed.
        assert_eq!(engine.lock().unwrap().index(), 1);
    }
}
