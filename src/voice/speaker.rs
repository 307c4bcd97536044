//! Synthesis worker
//!
//! Owns a FIFO inbox of messages and speaks them one at a time on a dedicated
//! thread. Producers hold a cloneable [`Speaker`] and only ever push; the blocking
//! synthesis call never runs on the caller's thread.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::config::{Config, TtsProvider};
use crate::voice::{AudioPlayback, TextToSpeech};
use crate::Result;

/// A blocking speech synthesis backend
pub trait Synthesizer {
    /// Speak `text`, returning once playback is done
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    fn speak(&mut self, text: &str) -> Result<()>;
}

impl<T: Synthesizer + ?Sized> Synthesizer for Box<T> {
    fn speak(&mut self, text: &str) -> Result<()> {
        (**self).speak(text)
    }
}

/// Notifications from the synthesis worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakerEvent {
    /// About to speak this message
    Speaking(String),
    /// The queue drained and the worker went idle
    Finished,
}

/// Producer handle for the synthesis queue
#[derive(Debug, Clone)]
pub struct Speaker {
    inbox: Sender<String>,
}

impl Speaker {
    /// Producer over an existing channel, for callers that drain the queue themselves
    #[must_use]
    pub const fn from_sender(inbox: Sender<String>) -> Self {
        Self { inbox }
    }

    /// Append a message to the queue
    ///
    /// Safe to call from any thread. Wakes the worker if it is idle.
    pub fn say(&self, text: impl Into<String>) {
        if self.inbox.send(text.into()).is_err() {
            tracing::warn!("synthesis worker gone, message dropped");
        }
    }
}

/// Handle to the synthesis thread
pub struct SynthesisWorker {
    speaker: Speaker,
    handle: JoinHandle<()>,
}

impl SynthesisWorker {
    /// Spawn the synthesis thread
    ///
    /// `open` runs on the worker thread and builds the synthesizer there.
    /// `pause` is slept after every message.
    ///
    /// # Errors
    ///
    /// Returns error if the thread cannot be spawned
    pub fn spawn<V, F>(
        pause: Duration,
        open: F,
        events: UnboundedSender<SpeakerEvent>,
    ) -> Result<Self>
    where
        V: Synthesizer,
        F: FnOnce() -> V + Send + 'static,
    {
        let (inbox, queue) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name("synthesis".to_string())
            .spawn(move || {
                let mut voice = open();
                drain(&mut voice, &queue, pause, &events);
            })?;

        Ok(Self {
            speaker: Speaker { inbox },
            handle,
        })
    }

    /// Get a producer handle
    #[must_use]
    pub fn speaker(&self) -> Speaker {
        self.speaker.clone()
    }

    /// Close the queue and wait for every pending message to be spoken
    ///
    /// Blocks until all other [`Speaker`] handles are dropped as well.
    pub fn finish(self) {
        drop(self.speaker);
        if self.handle.join().is_err() {
            tracing::error!("synthesis thread panicked");
        }
    }
}

fn drain<V: Synthesizer>(
    voice: &mut V,
    queue: &Receiver<String>,
    pause: Duration,
    events: &UnboundedSender<SpeakerEvent>,
) {
    // Idle until the next message, exit once every producer is gone
    while let Ok(first) = queue.recv() {
        let mut next = Some(first);

        while let Some(text) = next {
            let _ = events.send(SpeakerEvent::Speaking(text.clone()));
            tracing::debug!(text = %text, "speaking");

            if let Err(e) = voice.speak(&text) {
                tracing::warn!(error = %e, text = %text, "speech synthesis failed, skipping");
            }

            std::thread::sleep(pause);
            next = queue.try_recv().ok();
        }

        let _ = events.send(SpeakerEvent::Finished);
        tracing::trace!("speech queue drained");
    }

    tracing::debug!("synthesis worker exited");
}

/// Cloud TTS played through the default output device
pub struct CloudVoice {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl CloudVoice {
    /// Build from configuration
    ///
    /// Must run outside an async runtime (blocking HTTP client).
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or no output device exists
    pub fn from_config(config: &Config) -> Result<Self> {
        let voice = &config.voice;
        let api_key = config.tts_api_key()?;

        let tts = match voice.tts_provider {
            TtsProvider::OpenAI => TextToSpeech::new_openai(
                api_key,
                voice.tts_voice.clone(),
                voice.tts_speed,
                voice.tts_model.clone(),
            )?,
            TtsProvider::ElevenLabs => TextToSpeech::new_elevenlabs(
                api_key,
                voice.tts_voice.clone(),
                voice.tts_model.clone(),
            )?,
        };

        Ok(Self {
            tts,
            playback: AudioPlayback::new(voice.volume)?,
        })
    }
}

impl Synthesizer for CloudVoice {
    fn speak(&mut self, text: &str) -> Result<()> {
        let audio = self.tts.synthesize(text)?;
        self.playback.play_mp3(&audio)
    }
}

/// Synthesizer that produces no audio
///
/// Used when voice is disabled; messages still appear in the transcript.
#[derive(Debug, Default)]
pub struct SilentVoice;

impl Synthesizer for SilentVoice {
    fn speak(&mut self, text: &str) -> Result<()> {
        tracing::debug!(text, "voice disabled, not speaking");
        Ok(())
    }
}
