use std::fmt;

/// Answer to "has the background changed since it was last served?".
///
/// Only the exact token `1` signals a change. Surrounding whitespace is
/// ignored; every other value, including an empty body, reads as unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Unchanged,
    Changed,
}

impl SyncState {
    /// Interprets a state response body.
    ///
    /// Returns an error description when the body is not text at all.
    pub fn from_body(body: &[u8]) -> Result<Self, String> {
        let text = std::str::from_utf8(body).map_err(|err| {
            format!(
                "body is not UTF-8 text ({err}); first bytes: {:02x?}",
                &body[..body.len().min(8)]
            )
        })?;
        Ok(if text.trim() == "1" {
            Self::Changed
        } else {
            Self::Unchanged
        })
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unchanged => "unchanged",
            Self::Changed => "changed",
        })
    }
}
