//! Side-effect dispatcher: audio cue and local-notification decisions at
//! phase boundaries.
//!
//! The dispatcher consumes engine events and never touches timer state;
//! a failed cue or notification is logged and swallowed -- the engine's
//! wall-clock arithmetic is the only source of truth.

use thiserror::Error;

use crate::events::Event;
use crate::interval::Phase;

/// Silent cue sentinel: sound id 0 plays nothing.
pub const SILENT_CUE: u32 = 0;

#[derive(Error, Debug)]
pub enum SideEffectError {
    #[error("audio cue failed: {0}")]
    Cue(String),

    #[error("notification failed: {0}")]
    Notification(String),
}

/// Opaque handle to a scheduled local notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationId(pub u64);

/// Plays the near-expiry cue sound.
pub trait CueSink {
    fn play(&mut self, sound_id: u32) -> Result<(), SideEffectError>;
}

/// Schedules/cancels a local notification for a future phase expiry.
pub trait NotificationSink {
    fn schedule(&mut self, fire_at_ms: u64, phase: Phase)
        -> Result<NotificationId, SideEffectError>;
    fn cancel(&mut self, id: NotificationId) -> Result<(), SideEffectError>;
}

/// Dispatcher settings, sourced from the configuration collaborator.
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    pub notifications_enabled: bool,
    /// Cue sound id; [`SILENT_CUE`] disables the audible cue.
    pub cue_sound: u32,
}

pub struct Dispatcher<C, N> {
    cue: C,
    notifier: N,
    settings: DispatchSettings,
    foreground: bool,
    pending: Option<NotificationId>,
}

impl<C: CueSink, N: NotificationSink> Dispatcher<C, N> {
    pub fn new(cue: C, notifier: N, settings: DispatchSettings) -> Self {
        Self {
            cue,
            notifier,
            settings,
            foreground: true,
            pending: None,
        }
    }

    /// Foreground/background flag from the process lifecycle. Backgrounded,
    /// the audible cue is suppressed; the scheduled notification substitutes.
    pub fn set_foreground(&mut self, foreground: bool) {
        self.foreground = foreground;
    }

    pub fn has_pending_notification(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume one engine event. `now_ms` anchors notification scheduling.
    pub fn handle(&mut self, event: &Event, now_ms: u64) {
        match event {
            Event::NearExpiry { phase, .. } => {
                if self.foreground && self.settings.cue_sound != SILENT_CUE {
                    if let Err(err) = self.cue.play(self.settings.cue_sound) {
                        tracing::warn!(%err, ?phase, "near-expiry cue failed");
                    }
                }
            }
            Event::TimerStarted {
                phase,
                remaining_ms,
                ..
            } => {
                self.reschedule(now_ms + remaining_ms, *phase);
            }
            Event::PhaseAdvanced {
                phase,
                auto_started,
                remaining_ms,
                ..
            } => {
                if *auto_started {
                    self.reschedule(now_ms + remaining_ms, *phase);
                } else {
                    // Nothing will expire while paused.
                    self.cancel_pending();
                }
            }
            Event::TimerPaused { .. } | Event::TimerReset { .. } | Event::ExerciseDone { .. } => {
                self.cancel_pending();
            }
        }
    }

    /// At most one pending notification at a time.
    fn reschedule(&mut self, fire_at_ms: u64, phase: Phase) {
        self.cancel_pending();
        if !self.settings.notifications_enabled {
            return;
        }
        match self.notifier.schedule(fire_at_ms, phase) {
            Ok(id) => self.pending = Some(id),
            Err(err) => tracing::warn!(%err, "failed to schedule expiry notification"),
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(id) = self.pending.take() {
            if let Err(err) = self.notifier.cancel(id) {
                tracing::warn!(%err, "failed to cancel pending notification");
            }
        }
    }
}
