use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const VISIBLE_FOR: Duration = Duration::from_millis(4000);
pub const FADE_FOR: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Shown,
    Fading,
}

/// A single transient banner.
///
/// Showing a toast replaces the current text and starts a new hide timer
/// without cancelling the earlier ones, so an older timer may dismiss a newer
/// message early.
#[derive(Debug, Default)]
pub struct Toast {
    message: Option<String>,
    shown_at: Option<Instant>,
    timers: VecDeque<Instant>,
}

impl Toast {
    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some(message.into());
        self.shown_at = Some(now);
        self.timers.push_back(now + VISIBLE_FOR);
    }

    /// Fires every timer whose fade has completed.
    pub fn tick(&mut self, now: Instant) {
        while let Some(&fade_at) = self.timers.front() {
            if now < fade_at + FADE_FOR {
                break;
            }
            self.timers.pop_front();
            self.message = None;
        }
    }

    pub fn current(&self, now: Instant) -> Option<(&str, Phase)> {
        let message = self.message.as_deref()?;
        // a show after the oldest timer started fading restores full visibility
        let phase = match (self.timers.front(), self.shown_at) {
            (Some(&fade_at), Some(shown_at)) if now >= fade_at && shown_at < fade_at => {
                Phase::Fading
            }
            _ => Phase::Shown,
        };
        Some((message, phase))
    }
}
