//! Start/end pairing for registered stages.
//!
//! Each stage gets a [`PendingReference`] whose shape is fixed by its
//! [`ExecutionKind`] when the stage is registered: a single slot for
//! synchronous stages, a FIFO queue for asynchronous ones.

use crate::clock::{Clock, MonotonicClock, Timestamp};
use crate::history::Cycle;
use crate::stage::{ExecutionKind, Stage};
use std::collections::{HashMap, VecDeque};

/// Start timestamps that have not been closed yet.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingReference {
    /// One outstanding start at most
    Sync(Option<Timestamp>),
    /// Outstanding starts in start order
    Async(VecDeque<Timestamp>),
}

impl PendingReference {
    /// Empty storage shaped for `kind`.
    pub fn for_kind(kind: ExecutionKind) -> Self {
        match kind {
            ExecutionKind::Sync => PendingReference::Sync(None),
            ExecutionKind::Async => PendingReference::Async(VecDeque::new()),
        }
    }

    /// Record a start. A sync slot is overwritten.
    pub fn push(&mut self, at: Timestamp) {
        match self {
            PendingReference::Sync(slot) => *slot = Some(at),
            PendingReference::Async(queue) => queue.push_back(at),
        }
    }

    /// Take the reference time an end should pair with, if any.
    pub fn take(&mut self) -> Option<Timestamp> {
        match self {
            PendingReference::Sync(slot) => slot.take(),
            PendingReference::Async(queue) => queue.pop_front(),
        }
    }

    /// Number of outstanding starts.
    pub fn depth(&self) -> usize {
        match self {
            PendingReference::Sync(slot) => usize::from(slot.is_some()),
            PendingReference::Async(queue) => queue.len(),
        }
    }

    /// Drop all outstanding starts.
    pub fn clear(&mut self) {
        match self {
            PendingReference::Sync(slot) => *slot = None,
            PendingReference::Async(queue) => queue.clear(),
        }
    }
}

/// Tracks pending reference times per stage and turns matched ends into cycles.
pub struct TimingRecorder {
    clock: Box<dyn Clock>,
    pending: HashMap<String, PendingReference>,
}

impl TimingRecorder {
    /// Create a recorder using a [`MonotonicClock`].
    pub fn new() -> Self {
        Self::with_clock(Box::new(MonotonicClock::new()))
    }

    /// Create a recorder reading time from `clock`.
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            pending: HashMap::new(),
        }
    }

    /// Add empty pending storage for each stage.
    pub fn track<'a>(&mut self, stages: impl IntoIterator<Item = &'a Stage>) {
        for stage in stages {
            self.pending
                .insert(stage.name.clone(), PendingReference::for_kind(stage.kind));
        }
    }

    /// Forget every stage and its outstanding starts.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Record a start for `name` at the current time.
    ///
    /// Returns `false` without reading the clock if `name` is not tracked.
    pub fn start(&mut self, name: &str) -> bool {
        let Some(pending) = self.pending.get_mut(name) else {
            return false;
        };
        pending.push(self.clock.now());
        true
    }

    /// Close the oldest outstanding start for `name`.
    ///
    /// `closed_at` overrides the clock as the moment of completion. Returns
    /// `None` when the stage is unknown or has nothing outstanding.
    pub fn end(&mut self, name: &str, closed_at: Option<Timestamp>) -> Option<Cycle> {
        let ref_time = self.pending.get_mut(name)?.take()?;
        let closed_at = closed_at.unwrap_or_else(|| self.clock.now());
        Some(Cycle::new(ref_time, closed_at - ref_time))
    }

    /// Number of outstanding starts for `name` (0 when unknown).
    pub fn depth(&self, name: &str) -> usize {
        self.pending.get(name).map_or(0, PendingReference::depth)
    }

    /// Pending storage for `name`.
    pub fn pending(&self, name: &str) -> Option<&PendingReference> {
        self.pending.get(name)
    }

    /// Read the recorder's clock.
    #[inline]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

impl Default for TimingRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TimingRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimingRecorder")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
