use tracing::{debug, error, warn};

use crate::error::{CycleError, FailureKind};
use crate::jobs::{Completion, Job};
use crate::poller::{PollOutcome, Poller};
use crate::resource::ResourceStore;
use crate::stats::CycleStats;
use crate::surface::RenderedSurface;
use crate::updater::{BackgroundUpdater, FetchOutcome, SwapOutcome};

/// Event-loop side of the sync: turns ticks and completions into jobs.
///
/// All mutation happens through `&mut self` on the loop thread, one
/// completion at a time. Completions may arrive in any order; the updater's
/// sequence gate keeps the surface monotonic.
pub struct SyncAgent<S, R> {
    poller: Poller,
    updater: BackgroundUpdater<S, R>,
    stats: CycleStats,
    in_flight: usize,
}

impl<S: RenderedSurface, R: ResourceStore> SyncAgent<S, R> {
    pub fn new(surface: S, resources: R) -> Self {
        Self {
            poller: Poller::new(),
            updater: BackgroundUpdater::new(surface, resources),
            stats: CycleStats::default(),
            in_flight: 0,
        }
    }

    /// One poll tick. Fires regardless of how many earlier checks are still out.
    pub fn poll_tick(&mut self) -> Job {
        self.stats.polls += 1;
        self.in_flight += 1;
        self.poller.tick()
    }

    /// Applies a finished job and returns any follow-up work.
    pub fn handle(&mut self, completion: Completion) -> Vec<Job> {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::State { poll, result } => match self.poller.on_state(poll, result) {
                PollOutcome::Changed => {
                    self.stats.changed += 1;
                    let seq = self.updater.begin_update();
                    debug!(poll, seq, "background changed; fetching");
                    self.stats.fetches += 1;
                    self.dispatch(Job::FetchImage { seq })
                }
                PollOutcome::Unchanged => {
                    self.stats.unchanged += 1;
                    Vec::new()
                }
                PollOutcome::Failed(kind) => {
                    self.stats.record_failure(kind);
                    Vec::new()
                }
            },
            Completion::Image { seq, result } => match self.updater.on_fetched(seq, result) {
                Ok(FetchOutcome::Materialized { seq, payload }) => {
                    self.dispatch(Job::Preload { seq, payload })
                }
                Ok(FetchOutcome::Stale { .. }) => {
                    self.stats.stale += 1;
                    Vec::new()
                }
                Err(err) => {
                    self.fail_cycle(seq, err);
                    Vec::new()
                }
            },
            Completion::Preloaded { seq, result } => {
                match self.updater.on_preloaded(seq, result) {
                    Ok(SwapOutcome::Swapped { .. }) => self.stats.swaps += 1,
                    Ok(SwapOutcome::Stale { .. }) => self.stats.stale += 1,
                    Err(err) => self.fail_cycle(seq, err),
                }
                Vec::new()
            }
            Completion::Abandoned { job, seq, reason } => {
                self.stats.record_failure(FailureKind::Host);
                error!(job, seq = ?seq, %reason, "background job abandoned");
                if let Some(seq) = seq {
                    self.updater.abandon(seq);
                }
                Vec::new()
            }
        }
    }

    /// Jobs handed out and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_quiescent(&self) -> bool {
        self.in_flight == 0
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Returns the counters gathered since the last call and resets them.
    pub fn take_stats(&mut self) -> CycleStats {
        std::mem::take(&mut self.stats)
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn updater(&self) -> &BackgroundUpdater<S, R> {
        &self.updater
    }

    pub fn shutdown(&mut self) -> Result<(), CycleError> {
        if self.in_flight > 0 {
            debug!(in_flight = self.in_flight, "abandoning unfinished jobs");
        }
        self.updater.shutdown()
    }

    fn dispatch(&mut self, job: Job) -> Vec<Job> {
        self.in_flight += 1;
        vec![job]
    }

    fn fail_cycle(&mut self, seq: u64, err: CycleError) {
        let kind = err.kind();
        self.stats.record_failure(kind);
        match kind {
            FailureKind::Host => error!(seq, error = %err, "background update failed"),
            _ => warn!(seq, %kind, error = %err, "background update skipped"),
        }
    }
}
