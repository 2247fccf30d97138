//! Scripted CLI session tests
//!
//! Feed command lines through the parser and dispatcher the way the stdin
//! loop does, against a controller with in-memory tracks.

use cadence_cli::{execute, Command, Flow};
use cadence_playback::memory::{MemoryTrack, NullSinkFactory};
use cadence_playback::{PlaybackConfig, PlaybackController, PlaybackPhase};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// ===== Test Helpers =====

fn run_script(controller: &mut PlaybackController, script: &[&str]) -> (Flow, String) {
    let mut out = Vec::new();
    let mut flow = Flow::Continue;
    for line in script {
        let command: Command = line.parse().unwrap();
        flow = execute(controller, command, &mut out).unwrap();
        if flow == Flow::Quit {
            break;
        }
    }
    (flow, String::from_utf8(out).unwrap())
}

fn controller() -> PlaybackController {
    let (controller, _events) =
        PlaybackController::new(PlaybackConfig::default(), Arc::new(NullSinkFactory::new()));
    for title in ["Intro", "Verse", "Outro"] {
        controller.add(Arc::new(
            MemoryTrack::new(title, 4000).with_frame_delay(Duration::from_millis(1)),
        ));
    }
    controller
}

fn wait_for_index(controller: &PlaybackController, index: usize) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if controller.current_index() == Some(index) {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

// ===== Script Tests =====

#[test]
fn test_navigation_script() {
    let mut controller = controller();

    let (flow, _) = run_script(&mut controller, &["play 1", "next"]);
    assert_eq!(flow, Flow::Continue);
    assert!(wait_for_index(&controller, 1));

    run_script(&mut controller, &["next"]);
    assert!(wait_for_index(&controller, 2));

    let (_, out) = run_script(&mut controller, &["queue"]);
    assert!(out.contains("*   3. Unknown Artist - Outro"));

    run_script(&mut controller, &["stop"]);
    assert!(controller.wait_until_idle(Duration::from_secs(5)));
}

#[test]
fn test_quit_ends_script_and_stops_worker() {
    let mut controller = controller();

    let (flow, out) = run_script(&mut controller, &["play 2", "quit", "help"]);

    assert_eq!(flow, Flow::Quit);
    assert!(!out.contains("Commands:"));
    assert_eq!(controller.phase(), PlaybackPhase::Idle);
}

#[test]
fn test_help_lists_every_command() {
    let mut controller = controller();
    let (_, out) = run_script(&mut controller, &["help"]);

    for name in [
        "play", "pause", "stop", "next", "prev", "rm", "add", "shuffle", "loop", "seek", "queue",
        "status", "quit",
    ] {
        assert!(out.contains(name), "help is missing {}", name);
    }
}
