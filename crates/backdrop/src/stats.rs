use std::fmt;

use crate::error::FailureKind;

/// Counters accumulated between status reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub polls: u64,
    pub changed: u64,
    pub unchanged: u64,
    pub fetches: u64,
    pub swaps: u64,
    pub stale: u64,
    pub transport_errors: u64,
    pub protocol_errors: u64,
    pub decode_errors: u64,
    pub host_errors: u64,
}

impl CycleStats {
    pub fn record_failure(&mut self, kind: FailureKind) {
        match kind {
            FailureKind::Transport => self.transport_errors += 1,
            FailureKind::Protocol => self.protocol_errors += 1,
            FailureKind::Decode => self.decode_errors += 1,
            FailureKind::Host => self.host_errors += 1,
        }
    }

    pub fn failures(&self) -> u64 {
        self.transport_errors + self.protocol_errors + self.decode_errors + self.host_errors
    }
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "polls={} changed={} unchanged={} fetches={} swaps={} stale={} errors={} (transport={} protocol={} decode={} host={})",
            self.polls,
            self.changed,
            self.unchanged,
            self.fetches,
            self.swaps,
            self.stale,
            self.failures(),
            self.transport_errors,
            self.protocol_errors,
            self.decode_errors,
            self.host_errors
        )
    }
}
