//! Read-only inspection surface for live-inspection arenas.
//!
//! Debug tooling gets a [`DebugInspector`] borrowed from the arena instead of
//! a process-wide table, so the view cannot outlive the arena or mutate it.

use crate::arena::StageArena;
use crate::clock::Timestamp;
use crate::error::ArenaResult;
use crate::history::StageHistory;
use crate::stage::Stage;
use serde::{Deserialize, Serialize};

/// Borrowed view over every stage history of an arena.
#[derive(Debug, Clone, Copy)]
pub struct DebugInspector<'a> {
    arena: &'a StageArena,
}

impl<'a> DebugInspector<'a> {
    pub(crate) fn new(arena: &'a StageArena) -> Self {
        Self { arena }
    }

    /// Registered stage names in registration order.
    pub fn stage_names(&self) -> impl Iterator<Item = &'a str> {
        self.arena.stages().iter().map(|stage| stage.name.as_str())
    }

    /// History of one stage.
    pub fn history(&self, name: &str) -> Option<&'a StageHistory> {
        self.arena.stage_data(name)
    }

    /// Owned copy of all histories, in registration order.
    pub fn snapshot(&self) -> InspectionSnapshot {
        let stages = self
            .arena
            .stages()
            .iter()
            .map(|stage| StageEntry {
                stage: stage.clone(),
                history: self.history(&stage.name).cloned().unwrap_or_default(),
                pending: self.arena.pending_depth(&stage.name),
            })
            .collect();

        InspectionSnapshot {
            taken_at: self.arena.now(),
            recording: self.arena.is_recording(),
            capacity: self.arena.retention_mode().capacity(),
            stages,
        }
    }

    /// Snapshot serialized as JSON.
    pub fn to_json(&self) -> ArenaResult<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}

/// Point-in-time copy of an arena's histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionSnapshot {
    /// Arena clock reading when the snapshot was taken
    pub taken_at: Timestamp,
    /// Whether recording was enabled
    pub recording: bool,
    /// History capacity per stage
    pub capacity: usize,
    /// One entry per registered stage
    pub stages: Vec<StageEntry>,
}

impl InspectionSnapshot {
    /// Find a stage entry by name.
    pub fn get(&self, name: &str) -> Option<&StageEntry> {
        self.stages.iter().find(|entry| entry.stage.name == name)
    }
}

/// A stage and its history inside an [`InspectionSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageEntry {
    /// Name and execution kind
    #[serde(flatten)]
    pub stage: Stage,
    /// Copy of the stage's history
    pub history: StageHistory,
    /// Starts still waiting for an end
    pub pending: usize,
}
