//! Capture loop
//!
//! A dedicated thread that calibrates for ambient noise, then repeatedly captures
//! one phrase and submits it for transcription. Results are reported as
//! [`CaptureEvent`]s; the loop itself never touches the UI.
//!
//! Cancellation is cooperative: [`CaptureLoop::stop`] clears a flag that is checked
//! after every blocking call, so a stop takes effect within one phrase limit plus
//! the in-flight recognition request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;

use crate::Result;

/// One captured phrase of audio
#[derive(Debug, Clone)]
pub struct Phrase {
    /// Mono f32 samples
    pub samples: Vec<f32>,
    /// Sample rate of `samples`
    pub sample_rate: u32,
}

/// Outcome of a transcription request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcription {
    /// Confident transcription
    Text(String),
    /// Audio was processed but nothing intelligible came back
    NoMatch,
}

impl Transcription {
    /// Classify raw service output; blank text counts as no match
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Self::NoMatch
        } else {
            Self::Text(trimmed.to_string())
        }
    }
}

/// A blocking source of phrases, typically a microphone
pub trait PhraseSource {
    /// Measure ambient noise for `window` and adapt the speech threshold
    ///
    /// # Errors
    ///
    /// Returns error if the device fails
    fn calibrate(&mut self, window: Duration) -> Result<()>;

    /// Block until one phrase is captured or `limit` elapses
    ///
    /// Returns `Ok(None)` when no phrase started within the limit.
    ///
    /// # Errors
    ///
    /// Returns error if the device fails
    fn listen(&mut self, limit: Duration) -> Result<Option<Phrase>>;
}

/// A blocking speech-to-text service
pub trait Recognizer {
    /// Transcribe one phrase
    ///
    /// # Errors
    ///
    /// Returns error on transport or service failure
    fn recognize(&mut self, phrase: &Phrase) -> Result<Transcription>;
}

/// What went wrong in the capture loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The speech-to-text service failed; the loop keeps running
    Recognition,
    /// The audio device is unavailable; the loop has exited
    Device,
}

/// Events emitted by the capture loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A phrase was recognized
    Heard(String),
    /// A failure occurred
    Failed {
        /// Failure class
        kind: FailureKind,
        /// Underlying error description
        message: String,
    },
}

/// Timing parameters for the capture loop
#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    /// Ambient noise calibration window
    pub calibration: Duration,
    /// Maximum duration of one phrase
    pub phrase_limit: Duration,
}

impl From<&crate::config::CaptureConfig> for CaptureSettings {
    fn from(config: &crate::config::CaptureConfig) -> Self {
        Self {
            calibration: config.calibration,
            phrase_limit: config.phrase_limit,
        }
    }
}

/// Handle to a running capture thread
pub struct CaptureLoop {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureLoop {
    /// Spawn the capture thread
    ///
    /// `open` runs on the capture thread, so it may create non-`Send` resources
    /// such as cpal streams. If it fails, a [`FailureKind::Device`] event is
    /// emitted and the thread exits.
    ///
    /// # Errors
    ///
    /// Returns error if the thread cannot be spawned
    pub fn start<S, R, F>(
        settings: CaptureSettings,
        open: F,
        events: UnboundedSender<CaptureEvent>,
    ) -> Result<Self>
    where
        S: PhraseSource,
        R: Recognizer,
        F: FnOnce() -> Result<(S, R)> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let handle = std::thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || run_loop(settings, open, &thread_running, &events))?;

        tracing::debug!(
            phrase_limit_ms = settings.phrase_limit.as_millis(),
            "capture loop started"
        );

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Request termination and wait up to `timeout` for the thread to exit
    ///
    /// Returns true if the thread exited in time. Otherwise it is detached and
    /// will exit on its own after its current blocking call, without emitting
    /// further events.
    pub fn stop(mut self, timeout: Duration) -> bool {
        self.running.store(false, Ordering::SeqCst);

        let Some(handle) = self.handle.take() else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                tracing::warn!(
                    timeout_ms = timeout.as_millis(),
                    "capture thread still busy, detaching"
                );
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        if handle.join().is_err() {
            tracing::error!("capture thread panicked");
        }
        tracing::debug!("capture loop stopped");
        true
    }

    /// Check whether the capture thread has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn run_loop<S, R, F>(
    settings: CaptureSettings,
    open: F,
    running: &AtomicBool,
    events: &UnboundedSender<CaptureEvent>,
) where
    S: PhraseSource,
    R: Recognizer,
    F: FnOnce() -> Result<(S, R)>,
{
    let device_failure = |e: &crate::Error| {
        tracing::error!(error = %e, "audio input unavailable, capture loop exiting");
        let _ = events.send(CaptureEvent::Failed {
            kind: FailureKind::Device,
            message: e.to_string(),
        });
    };

    let (mut source, mut recognizer) = match open() {
        Ok(parts) => parts,
        Err(e) => {
            device_failure(&e);
            return;
        }
    };

    if let Err(e) = source.calibrate(settings.calibration) {
        device_failure(&e);
        return;
    }

    tracing::info!("listening");

    while running.load(Ordering::SeqCst) {
        let phrase = match source.listen(settings.phrase_limit) {
            Ok(Some(phrase)) => phrase,
            Ok(None) => continue,
            Err(e) => {
                device_failure(&e);
                return;
            }
        };

        if !running.load(Ordering::SeqCst) {
            break;
        }

        let event = match recognizer.recognize(&phrase) {
            Ok(Transcription::Text(text)) => {
                tracing::debug!(transcript = %text, "phrase recognized");
                CaptureEvent::Heard(text)
            }
            Ok(Transcription::NoMatch) => {
                tracing::debug!("phrase not understood, discarding");
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "speech recognition failed");
                CaptureEvent::Failed {
                    kind: FailureKind::Recognition,
                    message: e.to_string(),
                }
            }
        };

        // A stop that arrived during recognition suppresses the result
        if !running.load(Ordering::SeqCst) {
            break;
        }

        if events.send(event).is_err() {
            tracing::debug!("capture events receiver gone");
            break;
        }
    }

    tracing::debug!("capture loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_from_text() {
        assert_eq!(Transcription::from_text("  "), Transcription::NoMatch);
        assert_eq!(
            Transcription::from_text(" open google "),
            Transcription::Text("open google".to_string())
        );
    }
}
