//! The stage arena: registry, recorder, history and retention wired together.

use crate::clock::{Clock, MonotonicClock, Timestamp};
use crate::config::ArenaConfig;
use crate::error::{ArenaError, ArenaResult};
use crate::history::{CycleLog, StageHistory};
use crate::inspect::DebugInspector;
use crate::purge::{PurgeController, PurgeSink, RetentionMode};
use crate::stage::{Stage, StageRegistry, StageSpec};
use crate::timing::TimingRecorder;

/// Records start/end timings for a fixed set of named stages.
///
/// Recording calls never fail: unknown stage names, ends without a matching
/// start, and calls made while recording is skipped are silently ignored.
///
/// ```rust
/// use stage_timing::{ManualClock, StageArena};
///
/// let clock = ManualClock::new(0.0);
/// let mut arena = StageArena::builder()
///     .stage("render")
///     .live_inspection(10)
///     .clock(clock.clone())
///     .build()
///     .unwrap();
///
/// arena.start_stage("render");
/// clock.set(5.0);
/// arena.end_stage("render");
///
/// let history = arena.stage_data("render").unwrap();
/// assert_eq!(history.lifetime_count, 1);
/// assert_eq!(history.recent_cycles[0].elapsed, 5.0);
/// ```
pub struct StageArena {
    registry: StageRegistry,
    recorder: TimingRecorder,
    log: CycleLog,
    purge: PurgeController,
    skip_recording: bool,
}

impl StageArena {
    /// Start building an arena.
    pub fn builder() -> ArenaBuilder {
        ArenaBuilder::new()
    }

    /// Register more stages, or with `force` replace all of them.
    ///
    /// A forced call discards every history and outstanding start. On error
    /// nothing changes.
    pub fn initialize<I, S>(&mut self, specs: I, force: bool) -> ArenaResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<StageSpec>,
    {
        let added = self.registry.initialize(specs, force)?;
        if force {
            self.recorder.clear();
            self.log.clear();
        }
        self.recorder.track(&added);
        self.log.track(&added);
        Ok(())
    }

    /// Empty every history and drop outstanding starts, keeping the stages.
    pub fn reset(&mut self) {
        self.recorder.clear();
        self.log.clear();
        self.recorder.track(self.registry.stages());
        self.log.track(self.registry.stages());

        tracing::debug!(
            target: "stage_timing::registry",
            stages = self.registry.len(),
            "arena reset"
        );
    }

    /// Enable or disable recording.
    pub fn set_skip_recording(&mut self, skip: bool) {
        if self.skip_recording != skip {
            tracing::debug!(
                target: "stage_timing::control",
                skip_recording = skip,
                "recording toggled"
            );
        }
        self.skip_recording = skip;
    }

    /// Check if start/end calls currently have any effect.
    pub fn is_recording(&self) -> bool {
        !self.skip_recording
    }

    /// Signal the start of `name`.
    pub fn start_stage(&mut self, name: &str) {
        if self.skip_recording {
            return;
        }
        self.recorder.start(name);
    }

    /// Signal the end of `name` at the current time.
    pub fn end_stage(&mut self, name: &str) {
        self.finish(name, None);
    }

    /// Signal the end of `name` at `timestamp` instead of the current time.
    pub fn end_stage_at(&mut self, name: &str, timestamp: Timestamp) {
        self.finish(name, Some(timestamp));
    }

    fn finish(&mut self, name: &str, closed_at: Option<Timestamp>) {
        if self.skip_recording {
            return;
        }
        let Some(cycle) = self.recorder.end(name, closed_at) else {
            return;
        };
        if let Some(history) = self.log.record(name, cycle) {
            self.purge.after_record(name, history);
        }
    }

    /// Get the history of a stage.
    pub fn stage_data(&self, name: &str) -> Option<&StageHistory> {
        self.log.get(name)
    }

    /// Number of starts of `name` still waiting for an end.
    pub fn pending_depth(&self, name: &str) -> usize {
        self.recorder.depth(name)
    }

    /// Registered stages in registration order.
    pub fn stages(&self) -> &[Stage] {
        self.registry.stages()
    }

    /// The retention mode fixed at construction.
    pub fn retention_mode(&self) -> RetentionMode {
        self.purge.mode()
    }

    /// Number of snapshots handed to the purge sink.
    pub fn purged_count(&self) -> u64 {
        self.purge.purged()
    }

    /// Current reading of the arena's clock.
    pub fn now(&self) -> Timestamp {
        self.recorder.now()
    }

    /// Read-only view of all histories, available in live-inspection mode only.
    pub fn inspector(&self) -> Option<DebugInspector<'_>> {
        if self.purge.mode().is_live() {
            Some(DebugInspector::new(self))
        } else {
            None
        }
    }
}

impl std::fmt::Debug for StageArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageArena")
            .field("stages", &self.registry.stages())
            .field("purge", &self.purge)
            .field("skip_recording", &self.skip_recording)
            .finish_non_exhaustive()
    }
}

/// Builder for [`StageArena`].
pub struct ArenaBuilder {
    config: ArenaConfig,
    sink: Option<PurgeSink>,
    clock: Option<Box<dyn Clock>>,
}

impl ArenaBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self::from_config(ArenaConfig::default())
    }

    /// Create a builder from a parsed configuration.
    pub fn from_config(config: ArenaConfig) -> Self {
        Self {
            config,
            sink: None,
            clock: None,
        }
    }

    /// Add a stage.
    pub fn stage(mut self, stage: impl Into<StageSpec>) -> Self {
        self.config.stages.push(stage.into());
        self
    }

    /// Add several stages.
    pub fn stages<I, S>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StageSpec>,
    {
        self.config.stages.extend(stages.into_iter().map(Into::into));
        self
    }

    /// Start with recording disabled.
    pub fn skip_recording(mut self, skip: bool) -> Self {
        self.config.skip_recording = skip;
        self
    }

    /// Keep up to `capacity` recent cycles per stage instead of purging.
    pub fn live_inspection(mut self, capacity: usize) -> Self {
        self.config.live_inspection = true;
        self.config.retention_capacity = Some(capacity);
        self
    }

    /// Set the live-inspection history size.
    pub fn retention_capacity(mut self, capacity: usize) -> Self {
        self.config.retention_capacity = Some(capacity);
        self
    }

    /// Sink for purged histories in steady-state mode.
    ///
    /// The sink runs inside `end_stage` while the arena is borrowed (or, for a
    /// [`SharedStageArena`](crate::SharedStageArena), locked). It must not call
    /// back into the same arena.
    pub fn on_purge<F>(mut self, sink: F) -> Self
    where
        F: FnMut(&str, StageHistory) + Send + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Time source, [`MonotonicClock`] by default.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Validate the configuration and build the arena.
    pub fn build(self) -> ArenaResult<StageArena> {
        let purge = match self.config.retention_mode()? {
            RetentionMode::LiveInspection { capacity } => {
                if self.sink.is_some() {
                    tracing::debug!(
                        target: "stage_timing::purge",
                        "purge sink ignored in live-inspection mode"
                    );
                }
                PurgeController::live(capacity)
            }
            RetentionMode::SteadyState => {
                PurgeController::steady_state(self.sink.ok_or(ArenaError::MissingPurgeSink)?)
            }
        };

        let clock = self
            .clock
            .unwrap_or_else(|| Box::new(MonotonicClock::new()));

        let mut arena = StageArena {
            registry: StageRegistry::new(),
            recorder: TimingRecorder::with_clock(clock),
            log: CycleLog::new(),
            purge,
            skip_recording: self.config.skip_recording,
        };
        arena.initialize(self.config.stages, false)?;

        Ok(arena)
    }
}

impl Default for ArenaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
