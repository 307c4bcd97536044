//! Assistant logic
//!
//! Keyword rules, the interpreter that applies them, the process launcher they
//! drive, and the small UI state machine around listening and speaking.

pub mod commands;
pub mod launcher;
pub mod state;

pub use commands::{
    Action, CommandRule, DEFAULT_RULES, Interpreter, Outcome, Reply, SpeechSink, normalize,
};
pub use launcher::{AppSpec, LaunchTarget, Launcher, Platform, SystemLauncher};
pub use state::{IndicatorState, ListeningState, Pulse};
