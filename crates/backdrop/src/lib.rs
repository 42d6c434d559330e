//! Background synchronisation engine.
//!
//! The [`SyncAgent`] turns poll ticks and asynchronous completions into
//! [`Job`]s for an executor to run, and applies finished work to a
//! [`RenderedSurface`] through the [`BackgroundUpdater`]. Nothing in here
//! spawns threads or reads the clock; the host event loop owns both.

mod agent;
mod error;
mod jobs;
mod payload;
mod poller;
mod preload;
mod resource;
mod spool;
mod stats;
mod stylesheet;
mod surface;
mod updater;

pub use agent::SyncAgent;
pub use error::{CycleError, FailureKind};
pub use jobs::{execute, execute_guarded, Companion, Completion, Job};
pub use payload::ImagePayload;
pub use poller::{Poller, PollOutcome};
pub use preload::{preload, DecodeError, Preloaded};
pub use resource::{DisplayResource, MemoryResources, ResourceError, ResourceStore};
pub use spool::FileResources;
pub use stats::CycleStats;
pub use stylesheet::{background_rule, StylesheetSurface};
pub use surface::{MemorySurface, RenderedSurface, SurfaceError};
pub use updater::{BackgroundUpdater, FetchOutcome, SwapOutcome};
