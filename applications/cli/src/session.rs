//! Command dispatch against a running controller

use crate::commands::{Command, HELP};
use crate::error::Result;
use crate::render::{render_queue, render_status};
use cadence_desktop::FileTrack;
use cadence_playback::PlaybackController;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Whether the read loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Queue every file in `paths`, skipping the ones that cannot be opened
///
/// Returns the number of tracks added.
pub fn add_files<P: AsRef<Path>>(controller: &PlaybackController, paths: &[P]) -> usize {
    let mut added = 0;
    for path in paths {
        let path = path.as_ref();
        match FileTrack::open(path) {
            Ok(track) => {
                info!(sample_rate = track.sample_rate(), "Queued {}", track.path().display());
                controller.add(Arc::new(track));
                added += 1;
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    added
}

/// Apply one command, writing any direct reply to `out`
pub fn execute(
    controller: &mut PlaybackController,
    command: Command,
    out: &mut impl Write,
) -> Result<Flow> {
    match command {
        Command::Play(index) => controller.play_at(index)?,
        Command::Pause => {
            if controller.toggle_play_pause().is_none() {
                writeln!(out, "  nothing is playing")?;
            }
        }
        Command::Stop => controller.stop(),
        Command::Next => controller.next(),
        Command::Previous => controller.previous(),
        Command::Remove(index) => controller.remove_at(index)?,
        Command::Add(path) => {
            let track = FileTrack::open(&path)?;
            controller.add(Arc::new(track));
        }
        Command::Shuffle => {
            let shuffled = controller.toggle_shuffle();
            writeln!(out, "  shuffle {}", if shuffled { "on" } else { "off" })?;
        }
        Command::Loop => {
            let looping = controller.toggle_loop();
            writeln!(out, "  loop {}", if looping { "on" } else { "off" })?;
        }
        Command::Seek(ms) => match controller.scrub_release(ms) {
            Some(seek) => {
                let outcome = seek.wait();
                tracing::debug!(?outcome, ms, "Seek finished");
            }
            None => writeln!(out, "  nothing is playing")?,
        },
        Command::Queue => {
            let entries = controller.entries();
            writeln!(out, "{}", render_queue(&entries, controller.current_index()))?;
        }
        Command::Status => writeln!(out, "{}", render_status(&controller.snapshot()))?,
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => {
            controller.shutdown();
            return Ok(Flow::Quit);
        }
    }

    Ok(Flow::Continue)
}
