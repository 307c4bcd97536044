//! UI-thread state: listening toggle, speaking indicator and its pulse animation

use std::fmt;

/// Whether the capture loop should be running
///
/// Changes only through explicit start/stop actions, never through recognition events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListeningState {
    #[default]
    Idle,
    Listening,
}

impl fmt::Display for ListeningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Listening => write!(f, "Listening"),
        }
    }
}

/// Presentation-only indicator used to pick an animation style
///
/// Speaking is set when a message is handed to the synthesis worker, not when audio
/// actually starts, so it can run ahead of playback for multi-message queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndicatorState {
    #[default]
    Idle,
    Listening,
    Speaking,
}

impl IndicatorState {
    /// Indicator to fall back to once speech is done
    #[must_use]
    pub const fn at_rest(listening: ListeningState) -> Self {
        match listening {
            ListeningState::Idle => Self::Idle,
            ListeningState::Listening => Self::Listening,
        }
    }

    /// Pulse step per render tick
    const fn step(self) -> i32 {
        match self {
            Self::Idle => 1,
            Self::Listening => 3,
            Self::Speaking => 5,
        }
    }
}

/// Highest pulse intensity
pub const MAX_INTENSITY: u8 = 10;

/// Bouncing pulse value driven by the render tick
#[derive(Debug, Clone)]
pub struct Pulse {
    value: i32,
    direction: i32,
}

impl Default for Pulse {
    fn default() -> Self {
        Self::new()
    }
}

impl Pulse {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: 0,
            direction: 1,
        }
    }

    /// Advance one tick, returning the intensity in `0..=MAX_INTENSITY`
    pub fn tick(&mut self, state: IndicatorState) -> u8 {
        self.value += self.direction * state.step();
        if self.value > 9 {
            self.direction = -1;
        }
        if self.value < 0 {
            self.direction = 1;
        }
        self.intensity()
    }

    /// Current intensity in `0..=MAX_INTENSITY`
    #[must_use]
    pub fn intensity(&self) -> u8 {
        u8::try_from(self.value.clamp(0, i32::from(MAX_INTENSITY))).unwrap_or(0)
    }
}
