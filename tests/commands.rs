//! Command interpreter tests

use std::time::Duration;

use chrono::{Local, NaiveTime, Timelike};
use jarvis::assistant::commands::{
    ACTION_FAILED, FAREWELL, JOKES, NOT_RECOGNIZED, RECOGNITION_FAILED,
};
use jarvis::assistant::{Interpreter, LaunchTarget, Outcome};

mod common;

use common::{FailingLauncher, RecordingLauncher, RecordingSink};

const SHUTDOWN_DELAY: Duration = Duration::from_millis(1200);

fn interpreter() -> (Interpreter<RecordingLauncher>, RecordingLauncher) {
    let launcher = RecordingLauncher::default();
    (Interpreter::new(launcher.clone(), SHUTDOWN_DELAY), launcher)
}

#[test]
fn test_first_matching_rule_wins() {
    let (interpreter, launcher) = interpreter();
    let mut sink = RecordingSink::default();

    let outcome = interpreter.handle("open chrome and search google", &mut sink);

    assert_eq!(outcome, Outcome::Continue);
    assert_eq!(sink.said, ["Opening Google Sir"]);
    assert_eq!(
        launcher.launched(),
        [LaunchTarget::Url("https://www.google.com")]
    );
}

#[test]
fn test_matching_is_case_insensitive() {
    let (interpreter, launcher) = interpreter();
    let mut sink = RecordingSink::default();

    interpreter.handle("  OPEN YOUTUBE  ", &mut sink);

    assert_eq!(sink.said, ["Opening YouTube Sir"]);
    assert_eq!(
        launcher.launched(),
        [LaunchTarget::Url("https://www.youtube.com")]
    );
}

#[test]
fn test_unknown_command() {
    let (interpreter, launcher) = interpreter();
    let mut sink = RecordingSink::default();

    let outcome = interpreter.handle("make me a sandwich", &mut sink);

    assert_eq!(outcome, Outcome::Continue);
    assert_eq!(sink.said, [NOT_RECOGNIZED]);
    assert!(launcher.launched().is_empty());
}

#[test]
fn test_time_reply_is_current() {
    let (interpreter, launcher) = interpreter();
    let mut sink = RecordingSink::default();

    interpreter.handle("what time is it", &mut sink);

    assert_eq!(sink.said.len(), 1);
    let reply = &sink.said[0];
    let clock = reply
        .strip_prefix("The time is ")
        .and_then(|rest| rest.strip_suffix(" Sir"))
        .unwrap();
    let spoken = NaiveTime::parse_from_str(clock, "%H:%M:%S").unwrap();

    let now = Local::now().time();
    let diff = i64::from(now.num_seconds_from_midnight())
        - i64::from(spoken.num_seconds_from_midnight());
    // Allow for crossing midnight between the two reads
    assert!(diff.rem_euclid(86_400) <= 1, "spoken {spoken}, now {now}");
    assert!(launcher.launched().is_empty());
}

#[test]
fn test_date_reply() {
    let (interpreter, _launcher) = interpreter();
    let mut sink = RecordingSink::default();

    interpreter.handle("what's the date today", &mut sink);

    let today = Local::now().format("%d-%m-%Y").to_string();
    assert_eq!(sink.said, [format!("Today's date is {today} Sir")]);
}

#[test]
fn test_joke_comes_from_pool() {
    let (interpreter, _launcher) = interpreter();

    for _ in 0..10 {
        let mut sink = RecordingSink::default();
        interpreter.handle("tell me a joke", &mut sink);
        assert_eq!(sink.said.len(), 1);
        assert!(JOKES.contains(&sink.said[0].as_str()));
    }
}

#[test]
fn test_exit_schedules_shutdown() {
    let (interpreter, launcher) = interpreter();

    for phrase in ["exit", "please quit"] {
        let mut sink = RecordingSink::default();
        let outcome = interpreter.handle(phrase, &mut sink);

        assert_eq!(sink.said, [FAREWELL]);
        match outcome {
            Outcome::Shutdown { after } => assert!(after >= SHUTDOWN_DELAY),
            Outcome::Continue => panic!("{phrase:?} should schedule shutdown"),
        }
    }
    assert!(launcher.launched().is_empty());
}

#[test]
fn test_launch_failure_is_spoken() {
    let interpreter = Interpreter::new(FailingLauncher, SHUTDOWN_DELAY);
    let mut sink = RecordingSink::default();

    let outcome = interpreter.handle("open notepad", &mut sink);

    assert_eq!(outcome, Outcome::Continue);
    assert_eq!(sink.said, ["Opening Notepad Sir", ACTION_FAILED]);
}

#[test]
fn test_spotify_falls_back_to_web() {
    let (interpreter, launcher) = interpreter();
    let mut sink = RecordingSink::default();

    interpreter.handle("play something on spotify", &mut sink);

    match launcher.launched().as_slice() {
        [LaunchTarget::AppOrUrl(app, url)] => {
            assert_eq!(app.name, "Spotify");
            assert_eq!(*url, "https://open.spotify.com");
        }
        other => panic!("unexpected launches: {other:?}"),
    }
}

#[test]
fn test_recognition_failure_apology() {
    let (interpreter, _launcher) = interpreter();
    let mut sink = RecordingSink::default();

    interpreter.recognition_failed(&mut sink);

    assert_eq!(sink.said, [RECOGNITION_FAILED]);
}

#[test]
fn test_every_rule_reachable() {
    let (interpreter, _launcher) = interpreter();

    for rule in interpreter.rules() {
        for keyword in rule.keywords {
            let found = interpreter.find_rule(keyword).map(|r| r.name);
            assert!(found.is_some(), "{keyword} matches nothing");
        }
    }
    assert_eq!(interpreter.find_rule("sticky notes").map(|r| r.name), Some("sticky-notes"));
}
