mod client;
mod state;

pub use client::{CompanionClient, CompanionConfig, CompanionError, ErrorKind};
pub use state::SyncState;

pub const STATE_PATH: &str = "state/";
pub const IMAGE_PATH: &str = "bg/";

pub use reqwest::{StatusCode, Url};
