use std::cell::Cell;
use std::time::{Duration, Instant};

/// The two periodic jobs of a running game. Declaration order is the
/// firing order when both are due at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    Decay,
    Difficulty,
}

/// One firing of a periodic task, stamped with the generation that
/// scheduled it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub kind: TaskKind,
    pub generation: u64,
}

#[derive(Debug, Clone)]
struct PeriodicTask {
    kind: TaskKind,
    period: Duration,
    next_due: Duration,
}

/// Cancelable periodic tasks on a virtual timeline.
///
/// Every `schedule` or `cancel` bumps the generation, so a `Tick` handed
/// out earlier can be recognised as stale by whoever consumes it.
#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    generation: u64,
    tasks: Vec<PeriodicTask>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Drop whatever is running and start `periods` afresh from `now`
    pub fn schedule(&mut self, now: Duration, periods: &[(TaskKind, Duration)]) -> u64 {
        self.cancel();
        self.tasks = periods
            .iter()
            .map(|&(kind, period)| {
                let period = period.max(Duration::from_millis(1));
                PeriodicTask {
                    kind,
                    period,
                    next_due: now + period,
                }
            })
            .collect();
        self.generation
    }

    pub fn cancel(&mut self) {
        self.generation += 1;
        self.tasks.clear();
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.tasks.iter().map(|t| t.next_due).min()
    }

    /// Earliest tick due at or before `now`, if any. The task that fired is
    /// moved one period forward.
    pub fn pop_due(&mut self, now: Duration) -> Option<Tick> {
        let generation = self.generation;
        let task = self
            .tasks
            .iter_mut()
            .filter(|t| t.next_due <= now)
            .min_by_key(|t| (t.next_due, t.kind))?;

        task.next_due += task.period;
        Some(Tick {
            kind: task.kind,
            generation,
        })
    }
}

/// Time since some fixed origin
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to; used for headless runs
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
