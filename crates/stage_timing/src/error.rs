//! Error types for arena construction and stage registration.

use thiserror::Error;

/// Errors that can occur while configuring a stage arena.
///
/// Only setup and command parsing produce these. Recording calls never fail.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// A stage name was registered twice without forcing re-initialization
    #[error("Duplicate stage: {0}")]
    DuplicateStage(String),

    /// Live-inspection mode needs room for more than one cycle
    #[error("Invalid retention capacity: {0} (must be at least 2)")]
    InvalidCapacity(usize),

    /// Steady-state mode has nowhere to send purged cycles
    #[error("Steady-state mode requires an on_purge sink")]
    MissingPurgeSink,

    /// A control command string was not understood
    #[error("Invalid control command: {0}")]
    InvalidCommand(String),

    /// Failed to parse the arena configuration
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for arena setup operations.
pub type ArenaResult<T> = Result<T, ArenaError>;
