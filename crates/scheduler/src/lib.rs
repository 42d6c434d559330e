use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("task period must be greater than zero")]
    ZeroPeriod,
    #[error("task {0} is not scheduled")]
    UnknownTask(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One firing of a periodic task returned from [`Scheduler::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<K> {
    pub task: TaskId,
    pub kind: K,
    /// Deadline the task was due at.
    pub due: Instant,
    /// Whole periods that elapsed without a tick and were coalesced into this firing.
    pub missed: u32,
}

/// Owns periodic tasks and reports which are due when driven with explicit instants.
///
/// The scheduler never reads the clock itself. Callers pass `now` to
/// [`Scheduler::tick`], which lets a runtime loop sleep until
/// [`Scheduler::next_deadline`] while tests advance time by hand.
pub struct Scheduler<K> {
    tasks: BTreeMap<TaskId, PeriodicTask<K>>,
    next_id: u64,
}

struct PeriodicTask<K> {
    kind: K,
    period: Duration,
    deadline: Instant,
    fired: u64,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<K: Clone> Scheduler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `kind` to fire at `first` and then every `period` after that.
    pub fn every(
        &mut self,
        kind: K,
        period: Duration,
        first: Instant,
    ) -> Result<TaskId, SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.insert(
            id,
            PeriodicTask {
                kind,
                period,
                deadline: first,
                fired: 0,
            },
        );
        Ok(id)
    }

    pub fn cancel(&mut self, task: TaskId) -> Result<(), SchedulerError> {
        self.tasks
            .remove(&task)
            .map(|_| ())
            .ok_or(SchedulerError::UnknownTask(task))
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of times `task` has fired so far.
    pub fn fired_count(&self, task: TaskId) -> Option<u64> {
        self.tasks.get(&task).map(|state| state.fired)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.values().map(|task| task.deadline).min()
    }

    /// Time left until the earliest deadline, zero when something is already due.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Fires every task whose deadline is at or before `now`.
    ///
    /// A task fires at most once per call. If several periods were skipped
    /// they are reported through [`Fired::missed`] and the next deadline stays
    /// aligned to the task's first deadline.
    pub fn tick(&mut self, now: Instant) -> Vec<Fired<K>> {
        let mut fired = Vec::new();
        for (id, task) in self.tasks.iter_mut() {
            if task.deadline > now {
                continue;
            }
            let due = task.deadline;
            let late = now.duration_since(due);
            let missed = (late.as_nanos() / task.period.as_nanos()).min(u32::MAX as u128) as u32;
            task.deadline = due + task.period * missed.saturating_add(1);
            task.fired += 1;
            fired.push(Fired {
                task: *id,
                kind: task.kind.clone(),
                due,
                missed,
            });
        }
        fired.sort_by_key(|entry| (entry.due, entry.task));
        fired
    }
}
