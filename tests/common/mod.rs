//! Shared test utilities
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use jarvis::assistant::{LaunchTarget, Launcher, SpeechSink};
use jarvis::voice::{
    Phrase, PhraseSource, Recognizer, SAMPLE_RATE, SampleFeed, Synthesizer, Transcription,
};
use jarvis::{Error, Result};

/// Generate sine wave audio samples
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

/// Collects everything said
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub said: Vec<String>,
}

impl SpeechSink for RecordingSink {
    fn say(&mut self, text: &str) {
        self.said.push(text.to_string());
    }
}

/// Records launch requests instead of starting processes
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    pub launched: Arc<Mutex<Vec<LaunchTarget>>>,
}

impl RecordingLauncher {
    pub fn launched(&self) -> Vec<LaunchTarget> {
        self.launched.lock().unwrap().clone()
    }
}

impl Launcher for RecordingLauncher {
    fn launch(&self, target: &LaunchTarget) -> Result<()> {
        self.launched.lock().unwrap().push(*target);
        Ok(())
    }
}

/// Launcher that always fails
#[derive(Debug, Default)]
pub struct FailingLauncher;

impl Launcher for FailingLauncher {
    fn launch(&self, _target: &LaunchTarget) -> Result<()> {
        Err(Error::Action("no such application".to_string()))
    }
}

/// One scripted `listen` result
#[derive(Debug, Clone, Copy)]
pub enum Listen {
    /// A short phrase of audio
    Phrase,
    /// Nothing heard within the limit
    Silence,
    /// The device went away
    DeviceError,
}

/// Phrase source that replays a script, then stays silent
pub struct ScriptedSource {
    steps: VecDeque<Listen>,
    calibrate_fails: bool,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Listen>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            calibrate_fails: false,
        }
    }

    pub fn failing_calibration() -> Self {
        Self {
            steps: VecDeque::new(),
            calibrate_fails: true,
        }
    }
}

impl PhraseSource for ScriptedSource {
    fn calibrate(&mut self, _window: Duration) -> Result<()> {
        if self.calibrate_fails {
            return Err(Error::Audio("no input device available".to_string()));
        }
        Ok(())
    }

    fn listen(&mut self, limit: Duration) -> Result<Option<Phrase>> {
        match self.steps.pop_front() {
            Some(Listen::Phrase) => Ok(Some(Phrase {
                samples: generate_sine_samples(440.0, 0.5, 0.3),
                sample_rate: SAMPLE_RATE,
            })),
            Some(Listen::DeviceError) => Err(Error::Audio("device disconnected".to_string())),
            Some(Listen::Silence) | None => {
                std::thread::sleep(limit);
                Ok(None)
            }
        }
    }
}

/// One scripted `recognize` result
#[derive(Debug, Clone, Copy)]
pub enum Recognize {
    Text(&'static str),
    NoMatch,
    Fail,
}

/// Recognizer that replays a script, optionally slowly
pub struct ScriptedRecognizer {
    steps: VecDeque<Recognize>,
    delay: Duration,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedRecognizer {
    pub fn new(steps: impl IntoIterator<Item = Recognize>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Recognizer for ScriptedRecognizer {
    fn recognize(&mut self, _phrase: &Phrase) -> Result<Transcription> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        match self.steps.pop_front() {
            Some(Recognize::Text(text)) => Ok(Transcription::from_text(text)),
            Some(Recognize::Fail) => Err(Error::Stt("service unavailable".to_string())),
            Some(Recognize::NoMatch) | None => Ok(Transcription::NoMatch),
        }
    }
}

/// Synthesizer that records what it spoke
#[derive(Debug, Clone, Default)]
pub struct RecordingSynthesizer {
    pub spoken: Arc<Mutex<Vec<String>>>,
    pub fail_on: Option<&'static str>,
    pub delay: Duration,
}

impl RecordingSynthesizer {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl Synthesizer for RecordingSynthesizer {
    fn speak(&mut self, text: &str) -> Result<()> {
        std::thread::sleep(self.delay);
        if self.fail_on == Some(text) {
            return Err(Error::Tts("synthesis service returned 500".to_string()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Sample feed that plays a tone during set spans of wall-clock time
///
/// Samples accrue in real time from creation, like a live input device.
pub struct ClockedFeed {
    started: Instant,
    taken: usize,
    speech: Vec<(Duration, Duration)>,
}

impl ClockedFeed {
    pub fn new(speech: impl IntoIterator<Item = (Duration, Duration)>) -> Self {
        Self {
            started: Instant::now(),
            taken: 0,
            speech: speech.into_iter().collect(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn available(&self) -> usize {
        (self.started.elapsed().as_micros() * u128::from(SAMPLE_RATE) / 1_000_000) as usize
    }

    #[allow(clippy::cast_precision_loss)]
    fn sample(&self, index: usize) -> f32 {
        let at = Duration::from_secs_f64(index as f64 / f64::from(SAMPLE_RATE));
        let speaking = self.speech.iter().any(|(from, to)| at >= *from && at < *to);
        if speaking {
            let t = index as f32 / SAMPLE_RATE as f32;
            0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        } else {
            0.0
        }
    }
}

impl SampleFeed for ClockedFeed {
    fn take_samples(&mut self) -> Vec<f32> {
        let end = self.available();
        let samples = (self.taken..end).map(|i| self.sample(i)).collect();
        self.taken = end;
        samples
    }

    fn discard(&mut self) {
        self.taken = self.available();
    }
}
