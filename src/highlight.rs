//! Click flash: which country is highlighted, and until when.
//!
//! There is a single deadline slot, so any number of rapid clicks leaves
//! exactly one pending expiry, belonging to the latest click.

use std::time::{Duration, Instant};

pub const FLASH_DURATION: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightState {
    Idle,
    Flashing { country: String, expires_at: Instant },
}

#[derive(Debug, Clone)]
pub struct HighlightController {
    state: HighlightState,
    duration: Duration,
}

impl Default for HighlightController {
    fn default() -> Self {
        Self::new(FLASH_DURATION)
    }
}

impl HighlightController {
    pub fn new(duration: Duration) -> Self {
        Self {
            state: HighlightState::Idle,
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn state(&self) -> &HighlightState {
        &self.state
    }

    /// Start (or restart) the flash for `country`. Replaces any running flash.
    pub fn flash(&mut self, country: &str, now: Instant) {
        self.state = HighlightState::Flashing {
            country: country.to_string(),
            expires_at: now + self.duration,
        };
    }

    /// Fire the timer if it is due. Returns true if the state changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.state {
            HighlightState::Flashing { expires_at, .. } if now >= *expires_at => {
                self.state = HighlightState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Country currently flashing, ignoring whether the deadline has passed
    /// but not yet been ticked.
    pub fn active(&self) -> Option<&str> {
        match &self.state {
            HighlightState::Flashing { country, .. } => Some(country),
            HighlightState::Idle => None,
        }
    }

    /// Per-feature query for the renderer.
    pub fn is_highlighted(&self, country: &str, now: Instant) -> bool {
        match &self.state {
            HighlightState::Flashing {
                country: active,
                expires_at,
            } => active == country && now < *expires_at,
            HighlightState::Idle => false,
        }
    }

    /// Time until the pending expiry, if any.
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        match &self.state {
            HighlightState::Flashing { expires_at, .. } => {
                Some(expires_at.saturating_duration_since(now))
            }
            HighlightState::Idle => None,
        }
    }
}
