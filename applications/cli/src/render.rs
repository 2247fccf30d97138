//! Text rendering of player events and state

use cadence_playback::{ControllerSnapshot, IconState, PlayerEvent, TrackInfo};
use crossbeam_channel::Receiver;
use std::io::Write;
use std::thread::{self, JoinHandle};

/// Format milliseconds as `m:ss`
pub fn format_ms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// One line for an event, or `None` for events not worth printing
pub fn render_event(event: &PlayerEvent) -> Option<String> {
    match event {
        PlayerEvent::TrackChanged {
            title,
            album,
            artist,
        } => Some(format!("> {} - {} ({})", artist, title, album)),
        PlayerEvent::Progress {
            elapsed_ms,
            total_ms,
        } => Some(format!(
            "  [{} / {}]",
            format_ms(*elapsed_ms),
            format_ms(*total_ms)
        )),
        PlayerEvent::PlaybackIcon(IconState::Play) => Some("  (paused)".to_string()),
        PlayerEvent::PlaybackIcon(IconState::Pause) => None,
        PlayerEvent::Reset => Some("  (stopped)".to_string()),
        PlayerEvent::QueueChanged { entries } => Some(format!("  queue: {} entries", entries.len())),
        PlayerEvent::TransportEnabled(_) => None,
    }
}

/// Numbered queue listing with a marker on the current entry
pub fn render_queue(entries: &[TrackInfo], current: Option<usize>) -> String {
    if entries.is_empty() {
        return "  (queue is empty)".to_string();
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, info)| {
            let marker = if Some(i) == current { '*' } else { ' ' };
            format!("{} {:>3}. {} - {}", marker, i + 1, info.artist, info.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_status(snapshot: &ControllerSnapshot) -> String {
    let position = snapshot
        .current_index
        .map(|i| format!("{}/{}", i + 1, snapshot.queue_len))
        .unwrap_or_else(|| format!("-/{}", snapshot.queue_len));

    format!(
        "  {:?} ({:?}) entry {} frame {} shuffle:{} loop:{}",
        snapshot.phase,
        snapshot.play_state,
        position,
        snapshot.current_frame,
        on_off(snapshot.shuffled),
        on_off(snapshot.looping)
    )
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

/// Drain `events` on a background thread, printing to `out`
///
/// The thread ends when every sender is gone.
pub fn spawn_printer<W>(events: Receiver<PlayerEvent>, mut out: W) -> std::io::Result<JoinHandle<()>>
where
    W: Write + Send + 'static,
{
    thread::Builder::new()
        .name("cadence-events".into())
        .spawn(move || {
            for event in events {
                if let Some(line) = render_event(&event) {
                    if writeln!(out, "{}", line).and_then(|_| out.flush()).is_err() {
                        break;
                    }
                }
            }
        })
}
