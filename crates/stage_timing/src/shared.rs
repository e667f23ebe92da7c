//! Thread-shared arena handle and scope timers.
//!
//! Every mutation goes through one mutex per arena, giving all threads the
//! same total order of starts, ends and control commands. A poisoned lock
//! makes recording calls no-ops, matching how unknown stages are treated.

use crate::arena::StageArena;
use crate::clock::Timestamp;
use crate::control::ControlCommand;
use crate::history::StageHistory;
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable, thread-safe handle to a [`StageArena`].
#[derive(Debug, Clone)]
pub struct SharedStageArena {
    inner: Arc<Mutex<StageArena>>,
}

impl SharedStageArena {
    /// Wrap an arena for sharing.
    pub fn new(arena: StageArena) -> Self {
        Self {
            inner: Arc::new(Mutex::new(arena)),
        }
    }

    /// Lock the arena for direct access.
    ///
    /// Returns `None` if a previous holder panicked.
    pub fn lock(&self) -> Option<MutexGuard<'_, StageArena>> {
        self.inner.lock().ok()
    }

    /// Signal the start of `name`.
    pub fn start_stage(&self, name: &str) {
        if let Some(mut arena) = self.lock() {
            arena.start_stage(name);
        }
    }

    /// Signal the end of `name` at the current time.
    pub fn end_stage(&self, name: &str) {
        if let Some(mut arena) = self.lock() {
            arena.end_stage(name);
        }
    }

    /// Signal the end of `name` at `timestamp`.
    pub fn end_stage_at(&self, name: &str, timestamp: Timestamp) {
        if let Some(mut arena) = self.lock() {
            arena.end_stage_at(name, timestamp);
        }
    }

    /// Copy of a stage's current history.
    pub fn stage_data(&self, name: &str) -> Option<StageHistory> {
        self.lock()?.stage_data(name).cloned()
    }

    /// Reset every history.
    pub fn reset(&self) {
        self.apply(ControlCommand::Reset);
    }

    /// Enable or disable recording.
    pub fn set_skip_recording(&self, skip: bool) {
        self.apply(ControlCommand::SetSkipRecording(skip));
    }

    /// Apply a control command.
    pub fn apply(&self, command: ControlCommand) {
        if let Some(mut arena) = self.lock() {
            arena.apply(command);
        }
    }

    /// Start `name` and end it when the returned timer is dropped.
    pub fn time(&self, name: impl Into<String>) -> StageTimer {
        StageTimer::new(self.clone(), name)
    }
}

impl From<StageArena> for SharedStageArena {
    fn from(arena: StageArena) -> Self {
        Self::new(arena)
    }
}

/// Ends a stage when dropped.
///
/// ```rust
/// use stage_timing::{SharedStageArena, StageArena};
///
/// let arena = SharedStageArena::new(
///     StageArena::builder().stage("layout").live_inspection(8).build().unwrap(),
/// );
///
/// {
///     let _timer = arena.time("layout");
///     // ... layout work ...
/// }
///
/// assert_eq!(arena.stage_data("layout").unwrap().lifetime_count, 1);
/// ```
#[must_use = "the stage ends as soon as the timer is dropped"]
#[derive(Debug)]
pub struct StageTimer {
    arena: SharedStageArena,
    name: String,
    stopped: bool,
}

impl StageTimer {
    /// Start `name` on `arena`.
    pub fn new(arena: SharedStageArena, name: impl Into<String>) -> Self {
        let name = name.into();
        arena.start_stage(&name);
        Self {
            arena,
            name,
            stopped: false,
        }
    }

    /// Name of the timed stage.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// End the stage now instead of at drop.
    pub fn stop(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.arena.end_stage(&self.name);
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Time the rest of the enclosing scope as a stage.
///
/// ```rust
/// use stage_timing::{time_stage, SharedStageArena, StageArena};
///
/// let arena = SharedStageArena::new(
///     StageArena::builder().stage("render").live_inspection(8).build().unwrap(),
/// );
///
/// fn render(arena: &SharedStageArena) {
///     time_stage!(arena, "render");
///     // ... render work ...
/// }
///
/// render(&arena);
/// assert_eq!(arena.stage_data("render").unwrap().lifetime_count, 1);
/// ```
#[macro_export]
macro_rules! time_stage {
    ($arena:expr, $name:expr) => {
        let _stage_timer = $crate::SharedStageArena::time(&$arena, $name);
    };
}
