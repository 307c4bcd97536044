//! Phrase boundary detection
//!
//! Splits a microphone stream into phrases using RMS energy: a phrase starts when
//! energy rises above the threshold and ends after a run of silence. The threshold
//! is calibrated from ambient noise before listening starts.

use crate::voice::SAMPLE_RATE;

/// Threshold used before calibration
const DEFAULT_THRESHOLD: f32 = 0.03;

/// Calibrated threshold sits this far above ambient energy
const AMBIENT_RATIO: f32 = 1.5;

/// Minimum duration of speech to count as a phrase (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration that ends a phrase (in samples)
const SILENCE_SAMPLES: usize = 12800; // 0.8 seconds

/// State of the phrase detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech
    Idle,
    /// Speech detected, accumulating the phrase
    InPhrase,
}

/// Detects the start and end of spoken phrases
pub struct PhraseDetector {
    threshold: f32,
    state: DetectorState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
}

impl Default for PhraseDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PhraseDetector {
    /// Create a detector with the uncalibrated default threshold
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            state: DetectorState::Idle,
            speech_buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Set the energy threshold from a window of ambient noise
    ///
    /// The threshold never drops below `min_energy`.
    pub fn calibrate(&mut self, ambient: &[f32], min_energy: f32) {
        let ambient_energy = calculate_energy(ambient);
        self.threshold = (ambient_energy * AMBIENT_RATIO).max(min_energy);
        tracing::debug!(
            ambient_energy,
            threshold = self.threshold,
            "calibrated for ambient noise"
        );
    }

    /// Process audio samples
    ///
    /// Returns true once a phrase is complete (enough speech followed by silence)
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = calculate_energy(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.state = DetectorState::InPhrase;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected, phrase started");
                }
            }
            DetectorState::InPhrase => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                tracing::trace!(
                    buffer_len = self.speech_buffer.len(),
                    silence = self.silence_counter,
                    is_speech,
                    energy,
                    "in phrase"
                );

                if self.silence_counter > SILENCE_SAMPLES {
                    if self.speech_buffer.len() - self.silence_counter > MIN_SPEECH_SAMPLES {
                        tracing::debug!(samples = self.speech_buffer.len(), "phrase complete");
                        return true;
                    }
                    // Too short to be speech, a click or a cough
                    tracing::trace!("blip discarded");
                    self.reset();
                }
            }
        }

        false
    }

    /// Take the accumulated phrase, returning the detector to idle
    pub fn take_phrase(&mut self) -> Vec<f32> {
        let phrase = std::mem::take(&mut self.speech_buffer);
        self.reset();
        phrase
    }

    /// Get the accumulated speech buffer
    #[must_use]
    pub fn speech_buffer(&self) -> &[f32] {
        &self.speech_buffer
    }

    /// Check if a phrase is being accumulated
    #[must_use]
    pub fn in_phrase(&self) -> bool {
        self.state == DetectorState::InPhrase
    }

    /// Reset detector to idle state
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.speech_buffer.clear();
        self.silence_counter = 0;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }

    /// Get the current energy threshold
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Duration of the phrase accumulated so far, in seconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn phrase_secs(&self) -> f32 {
        self.speech_buffer.len() as f32 / SAMPLE_RATE as f32
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
