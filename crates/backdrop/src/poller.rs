use companion::{CompanionError, SyncState};
use tracing::{debug, info, trace, warn};

use crate::error::{CycleError, FailureKind};
use crate::jobs::Job;

/// How a single state check ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Changed,
    Unchanged,
    Failed(FailureKind),
}

/// Issues state checks and interprets their answers.
///
/// A missing companion is the normal idle state, so repeated failures are
/// only logged loudly when the kind of failure changes.
#[derive(Debug, Default)]
pub struct Poller {
    next_poll: u64,
    newest_answered: Option<u64>,
    reachable: Option<bool>,
    failure_streak: Option<FailureKind>,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) -> Job {
        let poll = self.next_poll;
        self.next_poll += 1;
        trace!(poll, "checking companion state");
        Job::CheckState { poll }
    }

    /// Whether the last answered poll reached the companion.
    pub fn reachable(&self) -> Option<bool> {
        self.reachable
    }

    pub fn on_state(
        &mut self,
        poll: u64,
        result: Result<SyncState, CompanionError>,
    ) -> PollOutcome {
        let newest = self.newest_answered.map_or(true, |seen| poll > seen);
        if newest {
            self.newest_answered = Some(poll);
        } else {
            trace!(poll, newest = ?self.newest_answered, "state answer arrived out of order");
        }

        match result {
            Ok(state) => {
                if newest {
                    self.mark_reachable();
                }
                match state {
                    SyncState::Changed => PollOutcome::Changed,
                    SyncState::Unchanged => PollOutcome::Unchanged,
                }
            }
            Err(err) => {
                let err = CycleError::from(err);
                let kind = err.kind();
                if newest {
                    self.mark_failed(kind, &err);
                } else {
                    debug!(poll, error = %err, "late state check failed");
                }
                PollOutcome::Failed(kind)
            }
        }
    }

    fn mark_reachable(&mut self) {
        if self.reachable != Some(true) {
            info!("companion reachable; watching for background changes");
        }
        self.reachable = Some(true);
        self.failure_streak = None;
    }

    fn mark_failed(&mut self, kind: FailureKind, err: &CycleError) {
        let repeated = self.failure_streak == Some(kind);
        self.failure_streak = Some(kind);
        if kind == FailureKind::Transport {
            let was_reachable = self.reachable == Some(true);
            self.reachable = Some(false);
            if repeated {
                debug!(error = %err, "companion still unreachable");
            } else if was_reachable {
                warn!(error = %err, "lost contact with companion; polling continues");
            } else {
                info!(error = %err, "companion not reachable; polling continues");
            }
        } else if repeated {
            debug!(%kind, error = %err, "state check failed again");
        } else {
            warn!(%kind, error = %err, "state check failed");
        }
    }
}
