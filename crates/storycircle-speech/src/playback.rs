// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-slot active playback.
//!
//! A session owns one [`PlaybackSlot`]. Starting any playback takes the slot,
//! stopping and returning whatever was playing before, so a synthesized clip
//! and a raw recording can never be active at the same time.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use storycircle_core::AudioBuffer;
use tracing::debug;

/// What is being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackKind {
    /// A message rendered in the author's trained voice.
    Synthesized,
    /// A recorded answer or local preview.
    Raw,
}

/// Identifies one playback so a late "finished" event cannot stop its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTicket(u64);

/// The clip currently holding the slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePlayback {
    pub ticket: PlaybackTicket,
    pub kind: PlaybackKind,
    pub message_id: Option<String>,
    pub audio: AudioBuffer,
}

#[derive(Debug, Default)]
pub struct PlaybackSlot {
    active: Mutex<Option<ActivePlayback>>,
    next_ticket: AtomicU64,
}

impl PlaybackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_active<T>(&self, f: impl FnOnce(&mut Option<ActivePlayback>) -> T) -> T {
        let mut guard = self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Takes the slot for a new clip. Returns the new ticket and the clip it displaced.
    pub fn start(
        &self,
        kind: PlaybackKind,
        audio: AudioBuffer,
        message_id: Option<String>,
    ) -> (PlaybackTicket, Option<ActivePlayback>) {
        let ticket = PlaybackTicket(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        let next = ActivePlayback {
            ticket,
            kind,
            message_id,
            audio,
        };
        let previous = self.with_active(|slot| slot.replace(next));
        if let Some(prev) = &previous {
            debug!(kind = ?prev.kind, "stopped previous playback");
        }
        (ticket, previous)
    }

    /// Stops whatever is playing.
    pub fn stop(&self) -> Option<ActivePlayback> {
        self.with_active(Option::take)
    }

    /// Releases the slot only if `ticket` still holds it.
    pub fn finish(&self, ticket: PlaybackTicket) -> bool {
        self.with_active(|slot| {
            if slot.as_ref().map(|p| p.ticket) == Some(ticket) {
                *slot = None;
                true
            } else {
                false
            }
        })
    }

    pub fn is_playing(&self) -> bool {
        self.with_active(|slot| slot.is_some())
    }

    /// Kind and message of the active clip.
    pub fn current(&self) -> Option<(PlaybackKind, Option<String>)> {
        self.with_active(|slot| slot.as_ref().map(|p| (p.kind, p.message_id.clone())))
    }
}
