//! Configuration management for Jarvis

pub mod file;

use std::str::FromStr;
use std::time::Duration;

use self::file::JarvisConfigFile;
use crate::{Error, Result};

/// Default greeting spoken after start-up
pub const DEFAULT_WELCOME: &str = "Hello Sir, I am Jarvis. What do you want me to do, Sir?";

/// Jarvis configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Voice configuration
    pub voice: VoiceConfig,

    /// Microphone capture configuration
    pub capture: CaptureConfig,

    /// Assistant behaviour
    pub assistant: AssistantConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable microphone input and audio output
    pub enabled: bool,

    /// Speech-to-text backend
    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// Text-to-speech backend
    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1", "`eleven_monolingual_v1`")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,

    /// Playback volume (0.0 to 1.0)
    pub volume: f32,
}

/// Microphone capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Ambient noise calibration window
    pub calibration: Duration,

    /// Maximum duration of one phrase
    pub phrase_limit: Duration,

    /// Lowest energy threshold calibration may settle on
    pub min_energy: f32,
}

/// Assistant behaviour
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Greeting spoken shortly after start-up
    pub welcome_message: String,

    /// Delay before the greeting
    pub welcome_delay: Duration,

    /// Delay between the farewell and process exit
    pub shutdown_delay: Duration,

    /// Pause between two queued utterances
    pub utterance_pause: Duration,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,
}

/// STT provider backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SttProvider {
    #[default]
    Whisper,
    Deepgram,
}

impl FromStr for SttProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "whisper" | "openai" => Ok(Self::Whisper),
            "deepgram" => Ok(Self::Deepgram),
            other => Err(Error::Config(format!("unknown STT provider: {other}"))),
        }
    }
}

/// TTS provider backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TtsProvider {
    #[default]
    OpenAI,
    ElevenLabs,
}

impl FromStr for TtsProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "elevenlabs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_provider: SttProvider::Whisper,
            stt_model: "whisper-1".to_string(),
            tts_provider: TtsProvider::OpenAI,
            tts_model: "tts-1".to_string(),
            tts_voice: "onyx".to_string(),
            tts_speed: 1.25,
            volume: 1.0,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            calibration: Duration::from_secs(1),
            phrase_limit: Duration::from_secs(6),
            min_energy: 0.01,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            welcome_message: DEFAULT_WELCOME.to_string(),
            welcome_delay: Duration::from_millis(800),
            shutdown_delay: Duration::from_millis(1200),
            utterance_pause: Duration::from_millis(100),
        }
    }
}

impl Config {
    /// Load configuration from the config file and process environment
    ///
    /// # Errors
    ///
    /// Returns error if a provider name is not recognized
    pub fn load(disable_voice: bool) -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok(), disable_voice)
    }

    /// Resolve configuration from a parsed config file and an environment lookup
    ///
    /// Environment values win over the file, the file wins over defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a provider name is not recognized
    pub fn from_sources(
        fc: JarvisConfigFile,
        env: impl Fn(&str) -> Option<String>,
        disable_voice: bool,
    ) -> Result<Self> {
        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY").or(fc.api_keys.openai),
            deepgram: env("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram),
            elevenlabs: env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs),
        };

        let defaults = VoiceConfig::default();
        let stt_provider = env("JARVIS_STT_PROVIDER")
            .or(fc.voice.stt_provider)
            .map(|s| s.parse::<SttProvider>())
            .transpose()?
            .unwrap_or_default();
        let tts_provider = env("JARVIS_TTS_PROVIDER")
            .or(fc.voice.tts_provider)
            .map(|s| s.parse::<TtsProvider>())
            .transpose()?
            .unwrap_or_default();

        let default_stt_model = match stt_provider {
            SttProvider::Whisper => defaults.stt_model.clone(),
            SttProvider::Deepgram => "nova-2".to_string(),
        };
        let default_tts_model = match tts_provider {
            TtsProvider::OpenAI => defaults.tts_model.clone(),
            TtsProvider::ElevenLabs => "eleven_monolingual_v1".to_string(),
        };

        let voice_enabled = if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
            false
        } else {
            fc.voice.enabled.unwrap_or(true)
        };

        let voice = VoiceConfig {
            enabled: voice_enabled,
            stt_provider,
            stt_model: env("JARVIS_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(default_stt_model),
            tts_provider,
            tts_model: env("JARVIS_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or(default_tts_model),
            tts_voice: env("JARVIS_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or(defaults.tts_voice),
            tts_speed: fc.voice.tts_speed.unwrap_or(defaults.tts_speed).clamp(0.25, 4.0),
            volume: fc.voice.volume.unwrap_or(defaults.volume).clamp(0.0, 1.0),
        };

        let capture_defaults = CaptureConfig::default();
        let capture = CaptureConfig {
            calibration: fc
                .capture
                .calibration_ms
                .map_or(capture_defaults.calibration, Duration::from_millis),
            phrase_limit: fc
                .capture
                .phrase_limit_ms
                .map_or(capture_defaults.phrase_limit, Duration::from_millis),
            min_energy: fc.capture.min_energy.unwrap_or(capture_defaults.min_energy),
        };

        if capture.phrase_limit.is_zero() {
            return Err(Error::Config(
                "capture.phrase_limit_ms must be greater than zero".to_string(),
            ));
        }

        let assistant_defaults = AssistantConfig::default();
        let assistant = AssistantConfig {
            welcome_message: fc
                .assistant
                .welcome_message
                .unwrap_or(assistant_defaults.welcome_message),
            welcome_delay: fc
                .assistant
                .welcome_delay_ms
                .map_or(assistant_defaults.welcome_delay, Duration::from_millis),
            shutdown_delay: fc
                .assistant
                .shutdown_delay_ms
                .map_or(assistant_defaults.shutdown_delay, Duration::from_millis),
            utterance_pause: fc
                .assistant
                .utterance_pause_ms
                .map_or(assistant_defaults.utterance_pause, Duration::from_millis),
        };

        Ok(Self {
            voice,
            capture,
            assistant,
            api_keys,
        })
    }

    /// API key for the configured STT provider
    ///
    /// # Errors
    ///
    /// Returns error if the key is missing
    pub fn stt_api_key(&self) -> Result<String> {
        let key = match self.voice.stt_provider {
            SttProvider::Whisper => self.api_keys.openai.clone(),
            SttProvider::Deepgram => self.api_keys.deepgram.clone(),
        };
        key.filter(|k| !k.is_empty()).ok_or_else(|| {
            Error::Config(format!(
                "API key required for {:?} speech recognition",
                self.voice.stt_provider
            ))
        })
    }

    /// API key for the configured TTS provider
    ///
    /// # Errors
    ///
    /// Returns error if the key is missing
    pub fn tts_api_key(&self) -> Result<String> {
        let key = match self.voice.tts_provider {
            TtsProvider::OpenAI => self.api_keys.openai.clone(),
            TtsProvider::ElevenLabs => self.api_keys.elevenlabs.clone(),
        };
        key.filter(|k| !k.is_empty()).ok_or_else(|| {
            Error::Config(format!(
                "API key required for {:?} speech synthesis",
                self.voice.tts_provider
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_sources(JarvisConfigFile::default(), env_from(&[]), false).unwrap();

        assert!(config.voice.enabled);
        assert_eq!(config.voice.stt_provider, SttProvider::Whisper);
        assert_eq!(config.voice.stt_model, "whisper-1");
        assert_eq!(config.capture.phrase_limit, Duration::from_secs(6));
        assert_eq!(config.capture.calibration, Duration::from_secs(1));
        assert_eq!(config.assistant.shutdown_delay, Duration::from_millis(1200));
        assert_eq!(config.assistant.welcome_delay, Duration::from_millis(800));
        assert_eq!(config.assistant.welcome_message, DEFAULT_WELCOME);
        assert!((config.voice.volume - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut fc = JarvisConfigFile::default();
        fc.voice.tts_voice = Some("echo".to_string());
        fc.api_keys.openai = Some("file-key".to_string());

        let config = Config::from_sources(
            fc,
            env_from(&[("JARVIS_TTS_VOICE", "fable"), ("OPENAI_API_KEY", "env-key")]),
            false,
        )
        .unwrap();

        assert_eq!(config.voice.tts_voice, "fable");
        assert_eq!(config.api_keys.openai.as_deref(), Some("env-key"));
        assert_eq!(config.stt_api_key().unwrap(), "env-key");
    }

    #[test]
    fn test_provider_specific_model_defaults() {
        let config = Config::from_sources(
            JarvisConfigFile::default(),
            env_from(&[("JARVIS_STT_PROVIDER", "Deepgram"), ("JARVIS_TTS_PROVIDER", "elevenlabs")]),
            false,
        )
        .unwrap();

        assert_eq!(config.voice.stt_provider, SttProvider::Deepgram);
        assert_eq!(config.voice.stt_model, "nova-2");
        assert_eq!(config.voice.tts_provider, TtsProvider::ElevenLabs);
        assert_eq!(config.voice.tts_model, "eleven_monolingual_v1");
        assert!(config.stt_api_key().is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let result = Config::from_sources(
            JarvisConfigFile::default(),
            env_from(&[("JARVIS_STT_PROVIDER", "carrier-pigeon")]),
            false,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_disable_voice_wins() {
        let mut fc = JarvisConfigFile::default();
        fc.voice.enabled = Some(true);
        let config = Config::from_sources(fc, env_from(&[]), true).unwrap();
        assert!(!config.voice.enabled);
    }

    #[test]
    fn test_zero_phrase_limit_rejected() {
        let mut fc = JarvisConfigFile::default();
        fc.capture.phrase_limit_ms = Some(0);
        assert!(Config::from_sources(fc, env_from(&[]), false).is_err());
    }

    #[test]
    fn test_volume_and_speed_clamped() {
        let mut fc = JarvisConfigFile::default();
        fc.voice.volume = Some(3.0);
        fc.voice.tts_speed = Some(10.0);
        let config = Config::from_sources(fc, env_from(&[]), false).unwrap();
        assert!((config.voice.volume - 1.0).abs() < f32::EPSILON);
        assert!((config.voice.tts_speed - 4.0).abs() < f64::EPSILON);
    }
}
