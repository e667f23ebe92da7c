//! Retention policy applied after every recorded cycle.
//!
//! In live-inspection mode the history is a drop-oldest ring buffer. In
//! steady-state mode every cycle is handed to the purge sink as a snapshot
//! and the live history is emptied again.

use crate::history::StageHistory;
use serde::{Deserialize, Serialize};

/// Capacity used when live inspection is requested without one.
pub const DEFAULT_LIVE_CAPACITY: usize = 250;

/// Callback receiving `(stage name, history snapshot)` for each purged cycle.
///
/// Runs synchronously on the `end_stage` path; it must not re-enter the arena.
pub type PurgeSink = Box<dyn FnMut(&str, StageHistory) + Send>;

/// How completed cycles are retained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum RetentionMode {
    /// Keep up to `capacity` recent cycles in memory
    LiveInspection { capacity: usize },
    /// Flush every cycle to the purge sink and keep nothing
    #[default]
    SteadyState,
}

impl RetentionMode {
    /// Maximum number of cycles a history holds between calls.
    pub fn capacity(&self) -> usize {
        match self {
            RetentionMode::LiveInspection { capacity } => *capacity,
            RetentionMode::SteadyState => 1,
        }
    }

    /// Check if this is live-inspection mode.
    pub fn is_live(&self) -> bool {
        matches!(self, RetentionMode::LiveInspection { .. })
    }
}

/// Applies the retention mode to a history right after a cycle lands in it.
pub struct PurgeController {
    mode: RetentionMode,
    sink: Option<PurgeSink>,
    purged: u64,
}

impl PurgeController {
    /// Keep a rolling window of `capacity` cycles.
    pub fn live(capacity: usize) -> Self {
        Self {
            mode: RetentionMode::LiveInspection { capacity },
            sink: None,
            purged: 0,
        }
    }

    /// Flush each cycle to `sink`.
    pub fn steady_state(sink: PurgeSink) -> Self {
        Self {
            mode: RetentionMode::SteadyState,
            sink: Some(sink),
            purged: 0,
        }
    }

    /// The retention mode in force.
    pub fn mode(&self) -> RetentionMode {
        self.mode
    }

    /// Number of snapshots handed to the sink so far.
    pub fn purged(&self) -> u64 {
        self.purged
    }

    /// Enforce retention on `history` after a cycle was appended to it.
    pub fn after_record(&mut self, name: &str, history: &mut StageHistory) {
        match self.mode {
            RetentionMode::LiveInspection { capacity } => {
                while history.recent_cycles.len() > capacity {
                    history.recent_cycles.pop_front();
                }
            }
            RetentionMode::SteadyState => {
                let snapshot = history.clone();
                if let Some(sink) = self.sink.as_mut() {
                    sink(name, snapshot);
                    self.purged += 1;
                }
                history.recent_cycles.clear();

                tracing::trace!(
                    target: "stage_timing::purge",
                    stage = name,
                    lifetime_count = history.lifetime_count,
                    "history purged"
                );
            }
        }
    }
}

impl std::fmt::Debug for PurgeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurgeController")
            .field("mode", &self.mode)
            .field("has_sink", &self.sink.is_some())
            .field("purged", &self.purged)
            .finish()
    }
}
