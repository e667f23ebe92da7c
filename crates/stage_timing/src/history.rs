//! Completed cycles and per-stage history.

use crate::clock::Timestamp;
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// One completed start/end pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    /// Timestamp recorded at start
    pub ref_time: Timestamp,
    /// Milliseconds between start and end
    pub elapsed: f64,
}

impl Cycle {
    /// Create a cycle.
    #[inline]
    pub fn new(ref_time: Timestamp, elapsed: f64) -> Self {
        Self { ref_time, elapsed }
    }

    /// Timestamp of the end signal.
    #[inline]
    pub fn end_time(&self) -> Timestamp {
        self.ref_time + self.elapsed
    }
}

/// Lifetime counter plus recently completed cycles for one stage.
///
/// Cloning produces a fully independent copy, which is what purge sinks
/// receive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageHistory {
    /// Completed cycles since the last reset, including purged ones
    pub lifetime_count: u64,
    /// Most recent cycles, oldest first
    pub recent_cycles: VecDeque<Cycle>,
}

impl StageHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent cycle still held.
    pub fn last_cycle(&self) -> Option<&Cycle> {
        self.recent_cycles.back()
    }

    /// Number of cycles still held.
    pub fn len(&self) -> usize {
        self.recent_cycles.len()
    }

    /// Check if no cycles are held.
    pub fn is_empty(&self) -> bool {
        self.recent_cycles.is_empty()
    }

    /// Iterate over held cycles, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Cycle> {
        self.recent_cycles.iter()
    }
}

/// Histories for every registered stage.
#[derive(Debug, Clone, Default)]
pub struct CycleLog {
    histories: HashMap<String, StageHistory>,
}

impl CycleLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty history for each stage.
    pub fn track<'a>(&mut self, stages: impl IntoIterator<Item = &'a Stage>) {
        for stage in stages {
            self.histories
                .insert(stage.name.clone(), StageHistory::new());
        }
    }

    /// Drop every history.
    pub fn clear(&mut self) {
        self.histories.clear();
    }

    /// Append `cycle` to the stage's history and bump its lifetime count.
    ///
    /// Returns the mutated history so retention can be applied to it, or
    /// `None` if the stage is unknown.
    pub fn record(&mut self, name: &str, cycle: Cycle) -> Option<&mut StageHistory> {
        let history = self.histories.get_mut(name)?;
        history.recent_cycles.push_back(cycle);
        history.lifetime_count += 1;

        tracing::trace!(
            target: "stage_timing::cycle",
            stage = name,
            ref_time = cycle.ref_time,
            elapsed = cycle.elapsed,
            lifetime_count = history.lifetime_count,
            "cycle recorded"
        );

        Some(history)
    }

    /// Get the history of a stage.
    pub fn get(&self, name: &str) -> Option<&StageHistory> {
        self.histories.get(name)
    }

    /// Iterate over all histories in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StageHistory)> {
        self.histories
            .iter()
            .map(|(name, history)| (name.as_str(), history))
    }
}
