//! Stage descriptors and the registry that owns them.

use crate::error::{ArenaError, ArenaResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// How starts and ends of a stage pair up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKind {
    /// At most one outstanding start; a second start replaces the first
    #[default]
    Sync,
    /// Any number of outstanding starts, closed oldest first
    Async,
}

impl fmt::Display for ExecutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionKind::Sync => f.write_str("sync"),
            ExecutionKind::Async => f.write_str("async"),
        }
    }
}

/// A registered stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Unique name within the arena
    pub name: String,
    /// Pairing behavior
    pub kind: ExecutionKind,
}

impl Stage {
    /// Create a stage descriptor.
    pub fn new(name: impl Into<String>, kind: ExecutionKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A stage as it appears in configuration, with an optional kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSpec {
    /// Stage name
    pub name: String,
    /// Execution kind, `Sync` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ExecutionKind>,
}

impl StageSpec {
    /// A stage spec with the default kind.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
        }
    }

    /// A synchronous stage.
    pub fn sync(name: impl Into<String>) -> Self {
        Self::new(name).with_kind(ExecutionKind::Sync)
    }

    /// An asynchronous stage.
    pub fn asynchronous(name: impl Into<String>) -> Self {
        Self::new(name).with_kind(ExecutionKind::Async)
    }

    /// Builder method to set the execution kind.
    pub fn with_kind(mut self, kind: ExecutionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Resolve into a stage descriptor.
    pub fn into_stage(self) -> Stage {
        Stage::new(self.name, self.kind.unwrap_or_default())
    }
}

impl From<&str> for StageSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<Stage> for StageSpec {
    fn from(stage: Stage) -> Self {
        Self::new(stage.name).with_kind(stage.kind)
    }
}

/// Ordered set of registered stages with unique names.
#[derive(Debug, Clone, Default)]
pub struct StageRegistry {
    stages: Vec<Stage>,
    index: HashMap<String, usize>,
}

impl StageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `specs`, returning the stages that were added.
    ///
    /// Without `force`, the new names are added next to the existing ones and
    /// any clash fails the whole call with nothing registered. With `force`,
    /// the registry is emptied first and rebuilt from `specs`. Names repeated
    /// within `specs` are rejected either way.
    pub fn initialize<I, S>(&mut self, specs: I, force: bool) -> ArenaResult<Vec<Stage>>
    where
        I: IntoIterator<Item = S>,
        S: Into<StageSpec>,
    {
        let stages: Vec<Stage> = specs
            .into_iter()
            .map(|spec| Into::<StageSpec>::into(spec).into_stage())
            .collect();

        let mut seen = HashSet::with_capacity(stages.len());
        for stage in &stages {
            let clashes_existing = !force && self.index.contains_key(&stage.name);
            if clashes_existing || !seen.insert(stage.name.as_str()) {
                return Err(ArenaError::DuplicateStage(stage.name.clone()));
            }
        }

        if force {
            self.stages.clear();
            self.index.clear();
        }

        for stage in &stages {
            self.index.insert(stage.name.clone(), self.stages.len());
            self.stages.push(stage.clone());
        }

        tracing::debug!(
            target: "stage_timing::registry",
            added = stages.len(),
            total = self.stages.len(),
            force,
            "stages registered"
        );

        Ok(stages)
    }

    /// Look up a stage by name.
    pub fn get(&self, name: &str) -> Option<&Stage> {
        self.index.get(name).map(|&i| &self.stages[i])
    }

    /// Get the execution kind of a stage.
    pub fn kind_of(&self, name: &str) -> Option<ExecutionKind> {
        self.get(name).map(|stage| stage.kind)
    }

    /// Check whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All stages in registration order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of registered stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if no stages are registered.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
