//! Daemon - the UI event loop
//!
//! Owns the listening state, the transcript and the speaking indicator. The
//! capture loop and the synthesis worker run on their own threads and report
//! back over channels; everything that touches presentation happens here.

use std::io::Write;
use std::pin::pin;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedSender};

use crate::assistant::{
    IndicatorState, Interpreter, Launcher, ListeningState, Outcome, SpeechSink, SystemLauncher,
};
use crate::console::{Console, Party};
use crate::voice::{
    CaptureEvent, CaptureLoop, CaptureSettings, CloudVoice, FailureKind, MicrophoneSource,
    SilentVoice, Speaker, SpeakerEvent, SpeechToText, SynthesisWorker, Synthesizer,
};
use crate::{Config, Result};

/// How long a stop waits for the capture thread before detaching it
const STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Render tick for the pulse animation
const RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// A typed line from the terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Start listening
    Start,
    /// Stop listening
    Stop,
    /// Exit immediately
    Close,
    /// Handle as if it had been spoken
    Utterance(String),
    /// Blank line
    Empty,
}

impl Input {
    /// Classify one line of terminal input
    #[must_use]
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Empty,
            "/start" => Self::Start,
            "/stop" => Self::Stop,
            "/close" | "/quit" => Self::Close,
            text => Self::Utterance(text.to_string()),
        }
    }
}

/// Speech sink that records the message in the transcript before queueing it
struct Mouth<'a, W> {
    speaker: &'a Speaker,
    console: &'a mut Console<W>,
}

impl<W: Write> SpeechSink for Mouth<'_, W> {
    fn say(&mut self, text: &str) {
        self.console.log_message(Party::Assistant, text);
        self.console.set_animation_state(IndicatorState::Speaking);
        self.speaker.say(text);
    }
}

/// UI-thread state shared by every event source
pub struct Session<L, W> {
    interpreter: Interpreter<L>,
    speaker: Speaker,
    console: Console<W>,
    listening: ListeningState,
    capture: Option<CaptureLoop>,
    stop_timeout: Duration,
}

impl<L: Launcher, W: Write> Session<L, W> {
    #[must_use]
    pub fn new(interpreter: Interpreter<L>, speaker: Speaker, console: Console<W>) -> Self {
        Self {
            interpreter,
            speaker,
            console,
            listening: ListeningState::Idle,
            capture: None,
            stop_timeout: STOP_TIMEOUT,
        }
    }

    /// Override how long [`Self::stop_listening`] waits for the capture thread
    #[must_use]
    pub const fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    fn mouth(&mut self) -> Mouth<'_, W> {
        Mouth {
            speaker: &self.speaker,
            console: &mut self.console,
        }
    }

    /// Queue a message for speaking and log it
    pub fn say(&mut self, text: &str) {
        self.mouth().say(text);
    }

    /// Start the capture loop unless one is already running
    ///
    /// # Errors
    ///
    /// Returns error if the capture thread cannot be started
    pub fn start_listening<F>(&mut self, start: F) -> Result<()>
    where
        F: FnOnce() -> Result<CaptureLoop>,
    {
        let running = self.capture.as_ref().is_some_and(|c| !c.is_finished());
        if self.listening == ListeningState::Listening && running {
            tracing::debug!("already listening");
            return Ok(());
        }

        // A loop that died on a device error is replaced
        if let Some(stale) = self.capture.take() {
            stale.stop(self.stop_timeout);
        }

        match start() {
            Ok(capture) => {
                self.capture = Some(capture);
                self.set_listening(ListeningState::Listening);
                Ok(())
            }
            Err(e) => {
                self.console.notice(&format!("Cannot start listening: {e}"));
                Err(e)
            }
        }
    }

    /// Stop the capture loop, waiting a bounded time for the thread to exit
    pub fn stop_listening(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.stop(self.stop_timeout);
        }
        if self.listening == ListeningState::Listening {
            self.set_listening(ListeningState::Idle);
        }
    }

    fn set_listening(&mut self, state: ListeningState) {
        self.listening = state;
        self.console.set_status(state);
        if self.console.animation_state() != IndicatorState::Speaking {
            self.console.set_animation_state(IndicatorState::at_rest(state));
        }
        tracing::info!(%state, "listening state changed");
    }

    /// Handle one utterance, spoken or typed
    pub fn handle_utterance(&mut self, text: &str) -> Outcome {
        self.console.log_message(Party::User, text);
        let Self {
            interpreter,
            speaker,
            console,
            ..
        } = self;
        interpreter.handle(text, &mut Mouth { speaker, console })
    }

    /// React to an event from the capture loop
    pub fn on_capture_event(&mut self, event: CaptureEvent) -> Outcome {
        // Results queued just before a stop are stale
        if self.listening == ListeningState::Idle {
            tracing::debug!(?event, "ignoring capture event while idle");
            return Outcome::Continue;
        }

        match event {
            CaptureEvent::Heard(text) => self.handle_utterance(&text),
            CaptureEvent::Failed { kind, message } => {
                tracing::debug!(?kind, %message, "capture failure reported");
                if kind == FailureKind::Device {
                    self.console
                        .notice(&format!("Microphone unavailable: {message}"));
                }
                let Self {
                    interpreter,
                    speaker,
                    console,
                    ..
                } = self;
                interpreter.recognition_failed(&mut Mouth { speaker, console });
                Outcome::Continue
            }
        }
    }

    /// React to an event from the synthesis worker
    pub fn on_speaker_event(&mut self, event: &SpeakerEvent) {
        match event {
            SpeakerEvent::Speaking(_) => {
                self.console.set_animation_state(IndicatorState::Speaking);
            }
            SpeakerEvent::Finished => {
                self.console
                    .set_animation_state(IndicatorState::at_rest(self.listening));
            }
        }
    }

    /// Advance the pulse animation
    pub fn tick(&mut self) -> u8 {
        self.console.render_tick()
    }

    /// Current listening state
    #[must_use]
    pub const fn listening(&self) -> ListeningState {
        self.listening
    }

    /// Presentation state
    #[must_use]
    pub const fn console(&self) -> &Console<W> {
        &self.console
    }
}

/// The Jarvis daemon - wires capture, interpretation and synthesis together
pub struct Daemon {
    config: Config,
    listen_on_start: bool,
}

impl Daemon {
    /// Create a new daemon instance
    #[must_use]
    pub const fn new(config: Config, listen_on_start: bool) -> Self {
        Self {
            config,
            listen_on_start,
        }
    }

    /// Run until closed, interrupted or shut down by command
    ///
    /// # Errors
    ///
    /// Returns error if the synthesis worker cannot be started
    #[allow(clippy::too_many_lines)]
    pub async fn run(self) -> Result<()> {
        let config = self.config;

        let (speaker_tx, mut speaker_rx) = mpsc::unbounded_channel();
        let voice_config = config.clone();
        let worker = SynthesisWorker::spawn(
            config.assistant.utterance_pause,
            move || open_voice(&voice_config),
            speaker_tx,
        )?;

        let interpreter = Interpreter::new(SystemLauncher::new(), config.assistant.shutdown_delay);
        let mut session = Session::new(interpreter, worker.speaker(), Console::stdout());

        let (capture_tx, mut capture_rx) = mpsc::unbounded_channel();
        let open_capture = || start_capture(&config, &capture_tx);

        session.console.notice("Type /start or /stop to toggle listening, /close to exit.");
        session.console.set_status(ListeningState::Idle);

        if self.listen_on_start {
            if config.voice.enabled {
                if let Err(e) = session.start_listening(open_capture) {
                    tracing::error!(error = %e, "failed to start listening");
                }
            } else {
                tracing::warn!("voice disabled, ignoring --listen");
            }
        }

        let (input_tx, mut input_rx) = mpsc::unbounded_channel();
        spawn_input_reader(input_tx)?;

        let (interrupt_tx, mut interrupt_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = interrupt_tx.send(()).await;
            }
        });

        let mut render = tokio::time::interval(RENDER_INTERVAL);

        let mut welcome = pin!(tokio::time::sleep(config.assistant.welcome_delay));
        let mut welcomed = false;

        let mut shutdown = pin!(tokio::time::sleep(Duration::ZERO));
        let mut shutdown_armed = false;

        tracing::info!(voice = config.voice.enabled, "jarvis ready");

        loop {
            let outcome = tokio::select! {
                _ = interrupt_rx.recv() => {
                    tracing::info!("interrupted");
                    break;
                }
                () = &mut shutdown, if shutdown_armed => {
                    tracing::info!("shutting down");
                    break;
                }
                () = &mut welcome, if !welcomed => {
                    welcomed = true;
                    session.say(&config.assistant.welcome_message);
                    Outcome::Continue
                }
                Some(event) = capture_rx.recv() => session.on_capture_event(event),
                Some(event) = speaker_rx.recv() => {
                    session.on_speaker_event(&event);
                    Outcome::Continue
                }
                Some(input) = input_rx.recv() => match input {
                    Input::Start if !config.voice.enabled => {
                        session.console.notice("Voice is disabled, type your commands instead.");
                        Outcome::Continue
                    }
                    Input::Start => {
                        if let Err(e) = session.start_listening(open_capture) {
                            tracing::error!(error = %e, "failed to start listening");
                        }
                        Outcome::Continue
                    }
                    Input::Stop => {
                        session.stop_listening();
                        Outcome::Continue
                    }
                    Input::Close => {
                        tracing::info!("closed by user");
                        break;
                    }
                    Input::Utterance(text) => session.handle_utterance(&text),
                    Input::Empty => Outcome::Continue,
                },
                _ = render.tick() => {
                    let intensity = session.tick();
                    tracing::trace!(intensity, "render tick");
                    Outcome::Continue
                }
            };

            if let Outcome::Shutdown { after } = outcome
                && !shutdown_armed
            {
                shutdown
                    .as_mut()
                    .reset(tokio::time::Instant::now() + after);
                shutdown_armed = true;
            }
        }

        session.stop_listening();
        // Pending speech is abandoned on exit; the worker thread dies with the process
        drop(worker);
        Ok(())
    }
}

/// Read terminal lines on a dedicated thread
///
/// A blocking std reader keeps an unanswered prompt from holding up runtime shutdown.
fn spawn_input_reader(inputs: UnboundedSender<Input>) -> Result<()> {
    std::thread::Builder::new()
        .name("input".to_string())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to read stdin");
                        break;
                    }
                };
                if inputs.send(Input::parse(&line)).is_err() {
                    break;
                }
            }
            tracing::debug!("stdin closed");
        })?;
    Ok(())
}

/// Build the synthesizer on the worker thread
///
/// Falls back to a silent voice if voice is disabled or the backend can't start.
fn open_voice(config: &Config) -> Box<dyn Synthesizer> {
    if !config.voice.enabled {
        return Box::new(SilentVoice);
    }

    match CloudVoice::from_config(config) {
        Ok(voice) => {
            tracing::info!(provider = ?config.voice.tts_provider, "speech output ready");
            Box::new(voice)
        }
        Err(e) => {
            tracing::error!(error = %e, "speech output unavailable, continuing silently");
            Box::new(SilentVoice)
        }
    }
}

/// Start a capture loop over the microphone
///
/// The STT key is resolved up front so a missing key is reported as a
/// configuration problem rather than a dead microphone.
fn start_capture(config: &Config, events: &UnboundedSender<CaptureEvent>) -> Result<CaptureLoop> {
    let api_key = config.stt_api_key()?;
    let mic_config = config.clone();
    CaptureLoop::start(
        CaptureSettings::from(&config.capture),
        move || open_microphone(&mic_config, api_key),
        events.clone(),
    )
}

/// Open the microphone and recognizer on the capture thread
///
/// # Errors
///
/// Returns error if the input device or the STT client is unavailable
pub fn open_microphone(
    config: &Config,
    api_key: String,
) -> Result<(MicrophoneSource, SpeechToText)> {
    let recognizer = SpeechToText::new(
        config.voice.stt_provider,
        api_key,
        config.voice.stt_model.clone(),
    )?;
    let source = MicrophoneSource::open(config.capture.min_energy)?;
    Ok((source, recognizer))
}
