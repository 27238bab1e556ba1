//! Terminal-flavored side-effect sinks.
//!
//! The mobile app plays an audio cue and schedules a local notification;
//! in a terminal the cue is the bell character and "notifications" are
//! log lines. The dispatcher contract is the same either way.

use std::io::Write;

use restbell_core::dispatch::{CueSink, NotificationId, NotificationSink, SideEffectError};
use restbell_core::Phase;

/// Rings the terminal bell for the near-expiry cue.
#[derive(Default)]
pub struct TerminalCue;

impl CueSink for TerminalCue {
    fn play(&mut self, _sound_id: u32) -> Result<(), SideEffectError> {
        let mut stderr = std::io::stderr();
        stderr
            .write_all(b"\x07")
            .and_then(|_| stderr.flush())
            .map_err(|err| SideEffectError::Cue(err.to_string()))
    }
}

/// Logs notification scheduling instead of talking to an OS service.
#[derive(Default)]
pub struct LogNotifier {
    next_id: u64,
}

impl NotificationSink for LogNotifier {
    fn schedule(
        &mut self,
        fire_at_ms: u64,
        phase: Phase,
    ) -> Result<NotificationId, SideEffectError> {
        self.next_id += 1;
        tracing::info!(fire_at_ms, ?phase, id = self.next_id, "scheduled expiry notification");
        Ok(NotificationId(self.next_id))
    }

    fn cancel(&mut self, id: NotificationId) -> Result<(), SideEffectError> {
        tracing::info!(id = id.0, "cancelled pending notification");
        Ok(())
    }
}
