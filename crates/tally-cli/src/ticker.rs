//! Tokio-backed tick source for the timer.

use std::time::Duration;

use tally_core::{Scheduler, Tick};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// One tick per second.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Spawns one interval task per acquisition, delivering ticks over a channel.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    period: Duration,
    sender: mpsc::UnboundedSender<Tick>,
}

impl IntervalScheduler {
    /// Creates a scheduler and the receiving end of its ticks.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        Self::with_period(TICK_PERIOD)
    }

    pub fn with_period(period: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { period, sender }, receiver)
    }
}

/// A running interval task. Dropping it aborts the task.
#[derive(Debug)]
pub struct TickTask(JoinHandle<()>);

impl Drop for TickTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl Scheduler for IntervalScheduler {
    type Handle = TickTask;

    fn acquire(&mut self, generation: u64) -> TickTask {
        let sender = self.sender.clone();
        let period = self.period;
        TickTask(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if sender.send(Tick::new(generation)).is_err() {
                    tracing::debug!(generation, "tick receiver gone");
                    break;
                }
            }
        }))
    }
}
