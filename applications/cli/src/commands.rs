//! Stdin command language
//!
//! One command per line. Queue positions are 1-based, the way they are
//! printed by `queue`.

use crate::error::CliError;
use std::path::PathBuf;
use std::str::FromStr;

pub const HELP: &str = "\
Commands:
  play N     play the Nth entry of the queue
  pause      toggle play/pause
  stop       stop playback
  next       skip to the next entry
  prev       go back to the previous entry
  rm N       remove the Nth entry
  add PATH   append a file to the queue
  shuffle    toggle shuffle
  loop       toggle loop
  seek MS    jump to MS milliseconds into the current track
  queue      list the queue
  status     show transport state
  help       show this help
  quit       exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Play the entry at a 0-based index
    Play(usize),
    Pause,
    Stop,
    Next,
    Previous,
    /// Remove the entry at a 0-based index
    Remove(usize),
    Add(PathBuf),
    Shuffle,
    Loop,
    Seek(u64),
    Queue,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (line, None),
        };

        let command = match (name.to_ascii_lowercase().as_str(), arg) {
            ("play", Some(n)) => Command::Play(position(n)?),
            ("pause", None) => Command::Pause,
            ("stop", None) => Command::Stop,
            ("next", None) => Command::Next,
            ("prev" | "previous", None) => Command::Previous,
            ("rm" | "remove", Some(n)) => Command::Remove(position(n)?),
            ("add", Some(path)) => Command::Add(PathBuf::from(path)),
            ("shuffle", None) => Command::Shuffle,
            ("loop", None) => Command::Loop,
            ("seek", Some(ms)) => Command::Seek(
                ms.parse()
                    .map_err(|_| CliError::Command(format!("not a position in ms: {}", ms)))?,
            ),
            ("queue" | "ls", None) => Command::Queue,
            ("status", None) => Command::Status,
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit" | "q", None) => Command::Quit,
            ("", _) => return Err(CliError::Command("empty line".to_string())),
            (other, _) => {
                return Err(CliError::Command(format!(
                    "unknown or malformed command '{}' (try 'help')",
                    other
                )))
            }
        };

        Ok(command)
    }
}

/// Parse a 1-based queue position into a 0-based index
fn position(arg: &str) -> Result<usize, CliError> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CliError::Command(format!(
            "queue positions start at 1, got '{}'",
            arg
        ))),
    }
}
