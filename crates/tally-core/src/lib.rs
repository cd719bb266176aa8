//! Core domain logic for the tally time tracker.
//!
//! This crate contains:
//! - Timer: the start/pause/stop state machine and its tick scheduling seam
//! - Store: the newest-first, in-memory list of recorded entries
//! - Aggregation: today/week totals, daily average, top project and day grouping
//! - Projects and formatting helpers shared by front ends

pub mod aggregate;
mod entry;
pub mod format;
mod project;
mod store;
pub mod timer;
mod types;

pub use aggregate::{DayBucket, DayGroups, ProjectTotal, Summary};
pub use entry::TimeEntry;
pub use project::{Project, ProjectCatalog};
pub use store::{EntryStore, Snapshot};
#[cfg(any(test, feature = "test-util"))]
pub use timer::{ManualHandle, ManualScheduler};
pub use timer::{Phase, Scheduler, Tick, Timer, TimerState};
pub use types::{EntryId, ProjectId, ValidationError};
