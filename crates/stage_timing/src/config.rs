//! Construction-time arena configuration.

use crate::error::{ArenaError, ArenaResult};
use crate::purge::{RetentionMode, DEFAULT_LIVE_CAPACITY};
use crate::stage::StageSpec;
use serde::{Deserialize, Serialize};

/// Serializable part of an arena's setup.
///
/// The purge sink is a callback and is passed to the builder separately.
///
/// ```rust
/// use stage_timing::ArenaConfig;
///
/// let config = ArenaConfig::from_json(
///     r#"{ "stages": [{ "name": "fetch", "kind": "async" }], "liveInspection": true }"#,
/// ).unwrap();
/// assert_eq!(config.retention_mode().unwrap().capacity(), 250);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArenaConfig {
    /// Stages to register, in order
    pub stages: Vec<StageSpec>,
    /// Start with recording disabled
    pub skip_recording: bool,
    /// Keep a rolling history instead of purging every cycle
    pub live_inspection: bool,
    /// History size in live-inspection mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_capacity: Option<usize>,
}

impl ArenaConfig {
    /// Create an empty configuration (steady-state, recording on).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> ArenaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> ArenaResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Builder method to add a stage.
    pub fn with_stage(mut self, stage: impl Into<StageSpec>) -> Self {
        self.stages.push(stage.into());
        self
    }

    /// Builder method to start with recording disabled.
    pub fn with_skip_recording(mut self, skip: bool) -> Self {
        self.skip_recording = skip;
        self
    }

    /// Builder method to select live-inspection mode.
    pub fn with_live_inspection(mut self, enabled: bool) -> Self {
        self.live_inspection = enabled;
        self
    }

    /// Builder method to set the live-inspection history size.
    pub fn with_retention_capacity(mut self, capacity: usize) -> Self {
        self.retention_capacity = Some(capacity);
        self
    }

    /// Resolve the retention mode, validating the capacity.
    ///
    /// Outside live inspection the capacity setting is ignored.
    pub fn retention_mode(&self) -> ArenaResult<RetentionMode> {
        if !self.live_inspection {
            return Ok(RetentionMode::SteadyState);
        }

        let capacity = self.retention_capacity.unwrap_or(DEFAULT_LIVE_CAPACITY);
        if capacity < 2 {
            return Err(ArenaError::InvalidCapacity(capacity));
        }
        Ok(RetentionMode::LiveInspection { capacity })
    }
}
