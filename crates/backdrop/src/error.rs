use std::fmt;

use companion::{CompanionError, ErrorKind};

use crate::preload::DecodeError;
use crate::resource::ResourceError;
use crate::surface::SurfaceError;

/// Anything that can end one poll or update cycle early.
///
/// None of these are fatal: the agent logs them and waits for the next tick.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Companion(#[from] CompanionError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Transport,
    Protocol,
    Decode,
    /// Local resource or surface failure.
    Host,
}

impl CycleError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Companion(err) => match err.kind() {
                ErrorKind::Transport => FailureKind::Transport,
                ErrorKind::Protocol => FailureKind::Protocol,
                ErrorKind::Setup => FailureKind::Host,
            },
            Self::Decode(_) => FailureKind::Decode,
            Self::Resource(_) | Self::Surface(_) => FailureKind::Host,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Decode => "decode",
            Self::Host => "host",
        })
    }
}
