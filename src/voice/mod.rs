//! Voice processing module
//!
//! Handles audio capture, phrase detection, STT, TTS and playback, plus the two
//! long-lived threads built on them: the capture loop and the synthesis worker.

mod capture;
pub mod listener;
mod microphone;
mod phrase;
mod playback;
pub mod speaker;
mod stt;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use listener::{
    CaptureEvent, CaptureLoop, CaptureSettings, FailureKind, Phrase, PhraseSource, Recognizer,
    Transcription,
};
pub use microphone::{MicrophoneSource, SampleFeed};
pub use phrase::{DetectorState, PhraseDetector, calculate_energy};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, apply_volume, decode_mp3};
pub use speaker::{CloudVoice, SilentVoice, Speaker, SpeakerEvent, SynthesisWorker, Synthesizer};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
