//! Microphone-backed phrase source

use std::time::{Duration, Instant};

use crate::Result;
use crate::voice::listener::{Phrase, PhraseSource};
use crate::voice::{AudioCapture, PhraseDetector, SAMPLE_RATE};

/// How often the capture buffer is drained
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A live stream of mono samples at [`SAMPLE_RATE`]
pub trait SampleFeed {
    /// Take everything captured since the last call
    fn take_samples(&mut self) -> Vec<f32>;

    /// Throw away anything captured so far
    fn discard(&mut self);
}

impl SampleFeed for AudioCapture {
    fn take_samples(&mut self) -> Vec<f32> {
        self.take_buffer()
    }

    fn discard(&mut self) {
        self.clear_buffer();
    }
}

/// Reads phrases from an input feed, the default input device unless told otherwise
///
/// The `limit` given to [`PhraseSource::listen`] bounds two things separately.
/// A call waits at most `limit` for speech, so the capture loop gets to check
/// its stop flag regularly. A phrase is cut once it has run for `limit` since
/// its first loud chunk, however many calls it spans. A call that runs out of
/// time mid-phrase returns `None` and keeps the partial phrase for the next one.
pub struct MicrophoneSource<F = AudioCapture> {
    feed: F,
    detector: PhraseDetector,
    min_energy: f32,
    poll_interval: Duration,
    phrase_started: Option<Instant>,
}

impl MicrophoneSource<AudioCapture> {
    /// Open the default input device and start streaming
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened
    pub fn open(min_energy: f32) -> Result<Self> {
        let mut capture = AudioCapture::new()?;
        capture.start()?;
        Ok(Self::new(capture, min_energy))
    }
}

impl<F: SampleFeed> MicrophoneSource<F> {
    /// Read phrases from an already running feed
    #[must_use]
    pub fn new(feed: F, min_energy: f32) -> Self {
        Self {
            feed,
            detector: PhraseDetector::new(),
            min_energy,
            poll_interval: POLL_INTERVAL,
            phrase_started: None,
        }
    }

    /// Drain the feed at a different rate
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Whether a phrase is carried over into the next `listen`
    #[must_use]
    pub const fn in_phrase(&self) -> bool {
        self.phrase_started.is_some()
    }

    fn take_phrase(&mut self) -> Phrase {
        self.phrase_started = None;
        Phrase {
            samples: self.detector.take_phrase(),
            sample_rate: SAMPLE_RATE,
        }
    }
}

impl<F: SampleFeed> PhraseSource for MicrophoneSource<F> {
    fn calibrate(&mut self, window: Duration) -> Result<()> {
        self.feed.discard();
        std::thread::sleep(window);
        let ambient = self.feed.take_samples();
        self.detector.calibrate(&ambient, self.min_energy);
        self.detector.reset();
        self.phrase_started = None;
        Ok(())
    }

    fn listen(&mut self, limit: Duration) -> Result<Option<Phrase>> {
        if !self.detector.in_phrase() {
            // Whatever was heard during recognition is stale
            self.feed.discard();
            self.phrase_started = None;
        }
        let window = Instant::now();

        loop {
            std::thread::sleep(self.poll_interval);

            let chunk = self.feed.take_samples();
            if !chunk.is_empty() {
                if self.detector.process(&chunk) {
                    return Ok(Some(self.take_phrase()));
                }
                if self.detector.in_phrase() {
                    self.phrase_started.get_or_insert_with(Instant::now);
                } else {
                    self.phrase_started = None;
                }
            }

            if let Some(started) = self.phrase_started
                && started.elapsed() >= limit
            {
                tracing::debug!(
                    secs = self.detector.phrase_secs(),
                    "phrase limit reached, cutting phrase"
                );
                return Ok(Some(self.take_phrase()));
            }

            if window.elapsed() >= limit {
                if self.phrase_started.is_some() {
                    tracing::trace!(
                        secs = self.detector.phrase_secs(),
                        "listen window over, phrase carried over"
                    );
                }
                return Ok(None);
            }
        }
    }
}
