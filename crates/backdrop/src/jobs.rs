use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use companion::{CompanionClient, CompanionError, SyncState};

use crate::payload::ImagePayload;
use crate::preload::{preload, DecodeError, Preloaded};

/// Source of state signals and background bytes.
pub trait Companion {
    fn check_state(&self) -> Result<SyncState, CompanionError>;
    fn fetch_background(&self) -> Result<Vec<u8>, CompanionError>;
}

impl Companion for CompanionClient {
    fn check_state(&self) -> Result<SyncState, CompanionError> {
        CompanionClient::check_state(self)
    }

    fn fetch_background(&self) -> Result<Vec<u8>, CompanionError> {
        CompanionClient::fetch_background(self)
    }
}

/// Blocking work requested by the agent, run off the event loop.
#[derive(Debug)]
pub enum Job {
    CheckState { poll: u64 },
    FetchImage { seq: u64 },
    Preload { seq: u64, payload: ImagePayload },
}

impl Job {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CheckState { .. } => "check-state",
            Self::FetchImage { .. } => "fetch-image",
            Self::Preload { .. } => "preload",
        }
    }

    /// Update cycle the job belongs to; poll checks belong to none.
    pub fn cycle(&self) -> Option<u64> {
        match self {
            Self::CheckState { .. } => None,
            Self::FetchImage { seq } | Self::Preload { seq, .. } => Some(*seq),
        }
    }
}

/// Finished [`Job`], delivered back to the agent in whatever order it completes.
#[derive(Debug)]
pub enum Completion {
    State {
        poll: u64,
        result: Result<SyncState, CompanionError>,
    },
    Image {
        seq: u64,
        result: Result<ImagePayload, CompanionError>,
    },
    Preloaded {
        seq: u64,
        result: Result<Preloaded, DecodeError>,
    },
    /// The worker panicked before the job produced a result.
    Abandoned {
        job: &'static str,
        seq: Option<u64>,
        reason: String,
    },
}

/// Runs `job` to completion on the calling thread.
pub fn execute<C: Companion + ?Sized>(companion: &C, job: Job) -> Completion {
    match job {
        Job::CheckState { poll } => Completion::State {
            poll,
            result: companion.check_state(),
        },
        Job::FetchImage { seq } => Completion::Image {
            seq,
            result: companion.fetch_background().map(ImagePayload::new),
        },
        Job::Preload { seq, payload } => Completion::Preloaded {
            seq,
            result: preload(&payload),
        },
    }
}

/// Runs `job` like [`execute`], but turns a panic into
/// [`Completion::Abandoned`] so every job reports back exactly once.
pub fn execute_guarded<C: Companion + ?Sized>(companion: &C, job: Job) -> Completion {
    let label = job.label();
    let seq = job.cycle();
    panic::catch_unwind(AssertUnwindSafe(|| execute(companion, job))).unwrap_or_else(|payload| {
        Completion::Abandoned {
            job: label,
            seq,
            reason: panic_reason(payload.as_ref()),
        }
    })
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
