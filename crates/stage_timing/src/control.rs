//! External control of a running arena.
//!
//! Hosts forward operator commands or development-mode events as
//! [`ControlCommand`] values, either applied directly or queued on a channel
//! that the owning thread drains between units of work.

use crate::arena::StageArena;
use crate::error::ArenaError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::mpsc::Receiver;

/// A command accepted from the host's control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "command", content = "value")]
pub enum ControlCommand {
    /// Empty all histories and outstanding starts
    Reset,
    /// Turn recording off (`true`) or back on (`false`)
    SetSkipRecording(bool),
}

impl FromStr for ControlCommand {
    type Err = ArenaError;

    /// Parses `reset`, `skip`, `skip on`, `skip off`, `pause` and `resume`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words: Vec<String> = s
            .split_whitespace()
            .map(|word| word.to_ascii_lowercase())
            .collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        match words.as_slice() {
            ["reset"] => Ok(ControlCommand::Reset),
            ["skip"] | ["skip", "on"] | ["pause"] => Ok(ControlCommand::SetSkipRecording(true)),
            ["skip", "off"] | ["resume"] => Ok(ControlCommand::SetSkipRecording(false)),
            _ => Err(ArenaError::InvalidCommand(s.trim().to_string())),
        }
    }
}

impl StageArena {
    /// Apply a control command.
    pub fn apply(&mut self, command: ControlCommand) {
        tracing::debug!(target: "stage_timing::control", ?command, "control command");
        match command {
            ControlCommand::Reset => self.reset(),
            ControlCommand::SetSkipRecording(skip) => self.set_skip_recording(skip),
        }
    }

    /// Apply every command waiting on `commands` without blocking.
    ///
    /// Returns how many were applied.
    pub fn drain_commands(&mut self, commands: &Receiver<ControlCommand>) -> usize {
        let mut applied = 0;
        for command in commands.try_iter() {
            self.apply(command);
            applied += 1;
        }
        applied
    }
}
