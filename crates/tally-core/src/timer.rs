//! The start/pause/stop timer.
//!
//! The timer counts whole seconds delivered as [`Tick`]s by a [`Scheduler`].
//! While the timer is running it holds exactly one scheduler handle; the
//! handle is dropped on every way out of [`Phase::Running`] (pause, stop, or
//! dropping the timer), which is what stops the underlying tick source.
//!
//! Each handle is tagged with a generation number and every tick carries the
//! generation of the handle that produced it. Ticks from a released handle
//! that were already queued are ignored, so pausing and resuming quickly can
//! neither lose nor double-count seconds.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entry::TimeEntry;
use crate::project::Project;
use crate::types::ProjectId;

/// One elapsed second, as reported by a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    generation: u64,
}

impl Tick {
    pub const fn new(generation: u64) -> Self {
        Self { generation }
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// A source of one-second ticks.
pub trait Scheduler {
    /// Guard for a live tick source. Dropping it must stop further ticks.
    type Handle;

    /// Starts delivering `Tick::new(generation)` once per second, the first
    /// one a full second from now.
    fn acquire(&mut self, generation: u64) -> Self::Handle;
}

#[cfg(any(test, feature = "test-util"))]
pub use manual::{ManualHandle, ManualScheduler};

#[cfg(any(test, feature = "test-util"))]
mod manual {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::{Scheduler, Tick};

    /// Scheduler for callers that deliver ticks themselves.
    ///
    /// It never produces ticks on its own; it only records which generation is
    /// current and how many handles are alive, so tests and replays can feed
    /// [`ManualScheduler::last_tick`] into [`Timer::tick`](super::Timer::tick).
    #[derive(Debug, Clone, Default)]
    pub struct ManualScheduler {
        live: Rc<Cell<usize>>,
        acquisitions: Rc<Cell<usize>>,
        last_generation: Rc<Cell<Option<u64>>>,
    }

    /// Handle returned by [`ManualScheduler`].
    #[derive(Debug)]
    pub struct ManualHandle {
        live: Rc<Cell<usize>>,
    }

    impl Drop for ManualHandle {
        fn drop(&mut self) {
            self.live.set(self.live.get().saturating_sub(1));
        }
    }

    impl ManualScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of handles that have not been dropped yet.
        pub fn live_handles(&self) -> usize {
            self.live.get()
        }

        /// Total number of handles ever handed out.
        pub fn acquisitions(&self) -> usize {
            self.acquisitions.get()
        }

        /// A tick from the most recently acquired handle.
        pub fn last_tick(&self) -> Option<Tick> {
            self.last_generation.get().map(Tick::new)
        }
    }

    impl Scheduler for ManualScheduler {
        type Handle = ManualHandle;

        fn acquire(&mut self, generation: u64) -> ManualHandle {
            self.live.set(self.live.get() + 1);
            self.acquisitions.set(self.acquisitions.get() + 1);
            self.last_generation.set(Some(generation));
            ManualHandle {
                live: Rc::clone(&self.live),
            }
        }
    }
}

/// Timer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

impl Phase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only view of the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerState {
    pub phase: Phase,
    pub elapsed_seconds: u64,
    pub selected_project_id: Option<ProjectId>,
    pub description: String,
}

/// The timer state machine.
///
/// Invalid requests (starting without a project, pausing while idle,
/// changing the project mid-run) are ignored and reported by returning
/// `false`; none of them is an error.
pub struct Timer<S: Scheduler> {
    scheduler: S,
    phase: Phase,
    elapsed: u64,
    project: Option<Project>,
    description: String,
    generation: u64,
    ticker: Option<S::Handle>,
}

impl<S: Scheduler> fmt::Debug for Timer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("phase", &self.phase)
            .field("elapsed", &self.elapsed)
            .field("project", &self.project.as_ref().map(Project::name))
            .field("description", &self.description)
            .field("generation", &self.generation)
            .field("ticking", &self.ticker.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: Scheduler> Timer<S> {
    pub const fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            phase: Phase::Idle,
            elapsed: 0,
            project: None,
            description: String::new(),
            generation: 0,
            ticker: None,
        }
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            phase: self.phase,
            elapsed_seconds: self.elapsed,
            selected_project_id: self.project.as_ref().map(Project::id),
            description: self.description.clone(),
        }
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn elapsed_seconds(&self) -> u64 {
        self.elapsed
    }

    pub const fn selected_project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether a tick source is currently held.
    pub const fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    /// Selects the project the next entry is recorded against. Idle only.
    pub fn select_project(&mut self, project: &Project) -> bool {
        if self.phase != Phase::Idle {
            tracing::debug!(phase = %self.phase, "project locked while timing");
            return false;
        }
        self.project = Some(project.clone());
        true
    }

    /// Sets the description for the next entry. Idle only.
    pub fn set_description(&mut self, text: impl Into<String>) -> bool {
        if self.phase != Phase::Idle {
            tracing::debug!(phase = %self.phase, "description locked while timing");
            return false;
        }
        self.description = text.into();
        true
    }

    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Idle {
            tracing::debug!(phase = %self.phase, "start ignored");
            return false;
        }
        let Some(project) = &self.project else {
            tracing::debug!("start ignored: no project selected");
            return false;
        };
        tracing::debug!(project = project.name(), "timer started");
        self.acquire();
        self.phase = Phase::Running;
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.phase != Phase::Running {
            tracing::debug!(phase = %self.phase, "pause ignored");
            return false;
        }
        self.release();
        self.phase = Phase::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != Phase::Paused {
            tracing::debug!(phase = %self.phase, "resume ignored");
            return false;
        }
        self.acquire();
        self.phase = Phase::Running;
        true
    }

    /// Pauses a running timer or resumes a paused one.
    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            Phase::Running => self.pause(),
            Phase::Paused => self.resume(),
            Phase::Idle => {
                tracing::debug!("toggle ignored while idle");
                false
            }
        }
    }

    /// Counts one second if the tick belongs to the live handle.
    pub fn tick(&mut self, tick: Tick) -> bool {
        if self.phase != Phase::Running || tick.generation != self.generation {
            tracing::debug!(
                phase = %self.phase,
                tick = tick.generation,
                current = self.generation,
                "stale tick dropped"
            );
            return false;
        }
        self.elapsed = self.elapsed.saturating_add(1);
        true
    }

    /// Stops the timer and returns the finished entry, if any.
    ///
    /// Nothing is recorded for zero elapsed seconds. The timer always returns
    /// to idle with the description cleared; the project stays selected.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<TimeEntry> {
        if self.phase == Phase::Idle {
            tracing::debug!("stop ignored while idle");
            return None;
        }
        self.release();
        self.phase = Phase::Idle;
        let elapsed = std::mem::take(&mut self.elapsed);
        let description = std::mem::take(&mut self.description);

        let project = self.project.as_ref()?;
        if elapsed == 0 {
            tracing::debug!("stopped with nothing tracked");
            return None;
        }
        match TimeEntry::new(project.name(), elapsed, description, now) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(%err, "discarding invalid entry");
                None
            }
        }
    }

    fn acquire(&mut self) {
        self.generation += 1;
        self.ticker = Some(self.scheduler.acquire(self.generation));
    }

    fn release(&mut self) {
        self.ticker = None;
    }
}
