//! Command interpreter
//!
//! Maps recognized text to a spoken reply and at most one side effect by
//! case-insensitive substring matching against an ordered rule table. The first
//! matching rule wins, so table order is precedence.

use std::time::Duration;

use chrono::{DateTime, Local};
use rand::seq::SliceRandom;

use super::launcher::{AppSpec, LaunchTarget, Launcher};

/// Reply when no rule matches
pub const NOT_RECOGNIZED: &str = "Sorry Sir, I don't recognize this command.";

/// Reply when a side effect fails
pub const ACTION_FAILED: &str = "Error executing command.";

/// Reply when speech recognition fails
pub const RECOGNITION_FAILED: &str = "There was an error with speech recognition.";

/// Reply for the shutdown rule
pub const FAREWELL: &str = "Goodbye Sir, shutting down.";

/// Joke pool, one picked at random per request
pub const JOKES: [&str; 3] = [
    "Why don't scientists trust atoms? Because they make up everything!",
    "I told my computer I needed a break, it said it needed one too!",
    "Why did the math book look sad? Because it had too many problems.",
];

/// Receives messages destined for speech
pub trait SpeechSink {
    /// Queue one message for speaking
    fn say(&mut self, text: &str);
}

/// What a rule says
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Fixed text
    Text(&'static str),
    /// Current wall clock time
    Time,
    /// Current date
    Date,
    /// Random joke
    Joke,
}

impl Reply {
    /// Render the reply for the given moment
    #[must_use]
    pub fn render_at(self, now: &DateTime<Local>) -> String {
        match self {
            Self::Text(text) => text.to_string(),
            Self::Time => format!("The time is {} Sir", now.format("%H:%M:%S")),
            Self::Date => format!("Today's date is {} Sir", now.format("%d-%m-%Y")),
            Self::Joke => JOKES
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(JOKES[0])
                .to_string(),
        }
    }
}

/// What a rule does besides speaking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing
    None,
    /// Open an application or web page
    Launch(LaunchTarget),
    /// Exit the process after the shutdown delay
    Shutdown,
}

/// One keyword rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRule {
    /// Short identifier for logs
    pub name: &'static str,
    /// Lowercase keywords; any one of them appearing in the utterance matches
    pub keywords: &'static [&'static str],
    /// Spoken reply
    pub reply: Reply,
    /// Side effect
    pub action: Action,
}

impl CommandRule {
    /// Check the rule against an already normalized utterance
    #[must_use]
    pub fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|k| normalized.contains(k))
    }
}

/// Result of handling one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep running
    Continue,
    /// Exit once `after` has elapsed
    Shutdown {
        /// Delay that lets the farewell play
        after: Duration,
    },
}

static CHROME: AppSpec = AppSpec {
    name: "Chrome",
    windows: &["cmd", "/C", "start", "chrome"],
    windows_install: None,
    macos: Some("Google Chrome"),
    unix: &["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"],
};

static NOTEPAD: AppSpec = AppSpec {
    name: "Notepad",
    windows: &["notepad"],
    windows_install: None,
    macos: Some("TextEdit"),
    unix: &["gnome-text-editor", "gedit", "kate", "mousepad", "xed"],
};

static CALCULATOR: AppSpec = AppSpec {
    name: "Calculator",
    windows: &["calc.exe"],
    windows_install: None,
    macos: Some("Calculator"),
    unix: &["gnome-calculator", "kcalc", "galculator", "qalculate-gtk"],
};

static PAINT: AppSpec = AppSpec {
    name: "Paint",
    windows: &["mspaint"],
    windows_install: None,
    macos: None,
    unix: &["pinta", "kolourpaint", "drawing"],
};

static SPOTIFY: AppSpec = AppSpec {
    name: "Spotify",
    windows: &[],
    windows_install: Some("Spotify/Spotify.exe"),
    macos: Some("Spotify"),
    unix: &["spotify"],
};

static CAMERA: AppSpec = AppSpec {
    name: "Camera",
    windows: &["cmd", "/C", "start", "microsoft.windows.camera:"],
    windows_install: None,
    macos: Some("Photo Booth"),
    unix: &["cheese", "snapshot", "guvcview"],
};

static PDF_READER: AppSpec = AppSpec {
    name: "PDF Reader",
    windows: &["cmd", "/C", "start", "acrord32"],
    windows_install: None,
    macos: Some("Preview"),
    unix: &["evince", "okular", "atril", "xreader"],
};

static STICKY_NOTES: AppSpec = AppSpec {
    name: "Sticky Notes",
    windows: &["StikyNot.exe"],
    windows_install: None,
    macos: Some("Stickies"),
    unix: &["xpad", "knotes", "indicator-stickynotes"],
};

/// The fixed rule table, in precedence order
pub static DEFAULT_RULES: &[CommandRule] = &[
    CommandRule {
        name: "youtube",
        keywords: &["youtube"],
        reply: Reply::Text("Opening YouTube Sir"),
        action: Action::Launch(LaunchTarget::Url("https://www.youtube.com")),
    },
    CommandRule {
        name: "google",
        keywords: &["google"],
        reply: Reply::Text("Opening Google Sir"),
        action: Action::Launch(LaunchTarget::Url("https://www.google.com")),
    },
    CommandRule {
        name: "gmail",
        keywords: &["gmail"],
        reply: Reply::Text("Opening Gmail Sir"),
        action: Action::Launch(LaunchTarget::Url("https://mail.google.com")),
    },
    CommandRule {
        name: "chrome",
        keywords: &["chrome"],
        reply: Reply::Text("Opening Chrome Sir"),
        action: Action::Launch(LaunchTarget::App(&CHROME)),
    },
    CommandRule {
        name: "notepad",
        keywords: &["notepad"],
        reply: Reply::Text("Opening Notepad Sir"),
        action: Action::Launch(LaunchTarget::App(&NOTEPAD)),
    },
    CommandRule {
        name: "calculator",
        keywords: &["calculator"],
        reply: Reply::Text("Opening Calculator Sir"),
        action: Action::Launch(LaunchTarget::App(&CALCULATOR)),
    },
    CommandRule {
        name: "paint",
        keywords: &["paint"],
        reply: Reply::Text("Opening Paint Sir"),
        action: Action::Launch(LaunchTarget::App(&PAINT)),
    },
    CommandRule {
        name: "spotify",
        keywords: &["spotify"],
        reply: Reply::Text("Opening Spotify Sir"),
        action: Action::Launch(LaunchTarget::AppOrUrl(&SPOTIFY, "https://open.spotify.com")),
    },
    CommandRule {
        name: "camera",
        keywords: &["camera"],
        reply: Reply::Text("Opening Camera Sir"),
        action: Action::Launch(LaunchTarget::App(&CAMERA)),
    },
    CommandRule {
        name: "pdf",
        keywords: &["pdf"],
        reply: Reply::Text("Opening PDF Reader Sir"),
        action: Action::Launch(LaunchTarget::App(&PDF_READER)),
    },
    CommandRule {
        name: "sticky-notes",
        keywords: &["sticky notes"],
        reply: Reply::Text("Opening Sticky Notes Sir"),
        action: Action::Launch(LaunchTarget::App(&STICKY_NOTES)),
    },
    CommandRule {
        name: "time",
        keywords: &["time"],
        reply: Reply::Time,
        action: Action::None,
    },
    CommandRule {
        name: "date",
        keywords: &["date"],
        reply: Reply::Date,
        action: Action::None,
    },
    CommandRule {
        name: "joke",
        keywords: &["joke"],
        reply: Reply::Joke,
        action: Action::None,
    },
    CommandRule {
        name: "exit",
        keywords: &["exit", "quit"],
        reply: Reply::Text(FAREWELL),
        action: Action::Shutdown,
    },
];

/// Normalize an utterance for matching
#[must_use]
pub fn normalize(utterance: &str) -> String {
    utterance.trim().to_lowercase()
}

/// Maps utterances to replies and side effects
pub struct Interpreter<L> {
    rules: Vec<CommandRule>,
    launcher: L,
    shutdown_delay: Duration,
}

impl<L: Launcher> Interpreter<L> {
    /// Interpreter over the default rule table
    #[must_use]
    pub fn new(launcher: L, shutdown_delay: Duration) -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec(), launcher, shutdown_delay)
    }

    /// Interpreter over a custom rule table, in precedence order
    #[must_use]
    pub fn with_rules(rules: Vec<CommandRule>, launcher: L, shutdown_delay: Duration) -> Self {
        Self {
            rules,
            launcher,
            shutdown_delay,
        }
    }

    /// First rule matching the utterance, if any
    #[must_use]
    pub fn find_rule(&self, utterance: &str) -> Option<&CommandRule> {
        let normalized = normalize(utterance);
        self.rules.iter().find(|rule| rule.matches(&normalized))
    }

    /// Handle one recognized utterance
    ///
    /// Speaks the matched reply before running the side effect. A failed side
    /// effect is reported as an extra spoken apology and never propagates.
    pub fn handle(&self, utterance: &str, sink: &mut impl SpeechSink) -> Outcome {
        let Some(rule) = self.find_rule(utterance) else {
            tracing::info!(utterance, "no command matched");
            sink.say(NOT_RECOGNIZED);
            return Outcome::Continue;
        };

        tracing::info!(rule = rule.name, utterance, "command matched");
        sink.say(&rule.reply.render_at(&Local::now()));

        match rule.action {
            Action::None => Outcome::Continue,
            Action::Launch(target) => {
                if let Err(e) = self.launcher.launch(&target) {
                    tracing::warn!(rule = rule.name, error = %e, "command action failed");
                    sink.say(ACTION_FAILED);
                }
                Outcome::Continue
            }
            Action::Shutdown => {
                tracing::info!(
                    delay_ms = self.shutdown_delay.as_millis(),
                    "shutdown scheduled"
                );
                Outcome::Shutdown {
                    after: self.shutdown_delay,
                }
            }
        }
    }

    /// React to a failed recognition request
    pub fn recognition_failed(&self, sink: &mut impl SpeechSink) {
        sink.say(RECOGNITION_FAILED);
    }

    /// The active rule table
    #[must_use]
    pub fn rules(&self) -> &[CommandRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_time_reply_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap();
        assert_eq!(Reply::Time.render_at(&now), "The time is 07:05:03 Sir");
    }

    #[test]
    fn test_date_reply_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap();
        assert_eq!(Reply::Date.render_at(&now), "Today's date is 09-03-2024 Sir");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Open YouTube  "), "open youtube");
    }

    #[test]
    fn test_multi_keyword_rule() {
        let exit = DEFAULT_RULES.iter().find(|r| r.name == "exit").unwrap();
        assert!(exit.matches("please quit now"));
        assert!(exit.matches("exit"));
        assert!(!exit.matches("stay"));
    }

    #[test]
    fn test_rule_names_unique() {
        let mut names: Vec<_> = DEFAULT_RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DEFAULT_RULES.len());
    }
}
