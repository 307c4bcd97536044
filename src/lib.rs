//! Jarvis - a keyword-driven desktop voice assistant
//!
//! This library provides the core of the assistant:
//! - Voice capture with ambient calibration and phrase detection
//! - Cloud speech-to-text and text-to-speech
//! - An ordered keyword rule table that speaks replies and launches applications
//! - A terminal front end with a transcript and a listening status
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  CaptureEvent   ┌──────────────────────┐
//! │   Capture Loop   │ ──────────────▶ │      UI loop         │
//! │ mic → phrase →   │                 │ Session / Interpreter│
//! │ STT (thread)     │                 │ Console (tokio)      │
//! └──────────────────┘                 └──────────┬───────────┘
//!                                                 │ Speaker::say
//!                        SpeakerEvent  ┌──────────▼───────────┐
//!                  ◀────────────────── │  Synthesis Worker    │
//!                                      │ FIFO → TTS → speaker │
//!                                      └──────────────────────┘
//! ```

pub mod assistant;
pub mod config;
pub mod console;
pub mod daemon;
pub mod error;
pub mod voice;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
