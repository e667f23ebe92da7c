//! Stage Timing
//!
//! This crate measures how long named units of work ("stages") take inside a
//! running process:
//! - Start/end pairing per stage, with a single slot for synchronous stages
//!   and a FIFO queue for stages that may overlap themselves
//! - Bounded per-stage history with a lifetime counter
//! - Either a rolling in-memory window for live inspection, or a purge sink
//!   that receives each completed cycle and leaves nothing behind
//! - Reset and recording toggles driven by a host control channel
//!
//! Recording calls are infallible. Unknown stage names, ends without a start
//! and calls made while recording is skipped are ignored without a trace.
//!
//! # Example
//!
//! ```rust
//! use stage_timing::{ManualClock, StageArena, StageSpec};
//! use std::sync::{Arc, Mutex};
//!
//! let flushed = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&flushed);
//! let clock = ManualClock::new(0.0);
//!
//! let mut arena = StageArena::builder()
//!     .stage("render")
//!     .stage(StageSpec::asynchronous("fetch"))
//!     .clock(clock.clone())
//!     .on_purge(move |name, snapshot| {
//!         sink.lock().unwrap().push((name.to_string(), snapshot));
//!     })
//!     .build()
//!     .unwrap();
//!
//! arena.start_stage("render");
//! clock.set(5.0);
//! arena.end_stage("render");
//!
//! assert_eq!(flushed.lock().unwrap().len(), 1);
//! assert!(arena.stage_data("render").unwrap().recent_cycles.is_empty());
//! ```

mod arena;
mod clock;
mod config;
mod control;
mod error;
mod history;
pub mod inspect;
mod purge;
mod shared;
mod stage;
mod timing;

pub use arena::{ArenaBuilder, StageArena};
pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use config::ArenaConfig;
pub use control::ControlCommand;
pub use error::{ArenaError, ArenaResult};
pub use history::{Cycle, CycleLog, StageHistory};
pub use inspect::{DebugInspector, InspectionSnapshot, StageEntry};
pub use purge::{PurgeController, PurgeSink, RetentionMode, DEFAULT_LIVE_CAPACITY};
pub use shared::{SharedStageArena, StageTimer};
pub use stage::{ExecutionKind, Stage, StageRegistry, StageSpec};
pub use timing::{PendingReference, TimingRecorder};
