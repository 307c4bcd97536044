//! Terminal presentation
//!
//! Append-only transcript, status line and the animation state the render tick reads.

use std::fmt;
use std::io::Write;

use chrono::{DateTime, Local};

use crate::assistant::{IndicatorState, ListeningState, Pulse};

/// Who said a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    /// The person talking to the assistant
    User,
    /// The assistant
    Assistant,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "You"),
            Self::Assistant => write!(f, "Jarvis"),
        }
    }
}

/// One transcript line
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub at: DateTime<Local>,
    pub party: Party,
    pub text: String,
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.at.format("%H:%M:%S"), self.party, self.text)
    }
}

/// Terminal front end
pub struct Console<W> {
    out: W,
    transcript: Vec<TranscriptEntry>,
    animation: IndicatorState,
    pulse: Pulse,
}

impl Console<std::io::Stdout> {
    /// Console writing to stdout
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Console<W> {
    /// Console writing to `out`
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            transcript: Vec::new(),
            animation: IndicatorState::Idle,
            pulse: Pulse::new(),
        }
    }

    /// Append a line to the transcript
    pub fn log_message(&mut self, party: Party, text: &str) {
        let entry = TranscriptEntry {
            at: Local::now(),
            party,
            text: text.to_string(),
        };
        self.emit(&entry.to_string());
        self.transcript.push(entry);
    }

    /// Show the listening status
    pub fn set_status(&mut self, state: ListeningState) {
        self.emit(&format!("Status: {state}"));
    }

    /// Pick the animation style
    pub fn set_animation_state(&mut self, state: IndicatorState) {
        if self.animation != state {
            tracing::trace!(from = ?self.animation, to = ?state, "animation state");
        }
        self.animation = state;
    }

    /// Advance the pulse animation by one render tick
    pub fn render_tick(&mut self) -> u8 {
        self.pulse.tick(self.animation)
    }

    /// Current animation style
    #[must_use]
    pub const fn animation_state(&self) -> IndicatorState {
        self.animation
    }

    /// Everything logged so far
    #[must_use]
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Print a free-form notice
    pub fn notice(&mut self, text: &str) {
        self.emit(text);
    }

    /// Underlying writer
    pub const fn writer(&self) -> &W {
        &self.out
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write to console");
        }
    }
}
