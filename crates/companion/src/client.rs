use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use tracing::trace;

use crate::state::SyncState;
use crate::{IMAGE_PATH, STATE_PATH};

#[derive(Debug, thiserror::Error)]
pub enum CompanionError {
    #[error("invalid companion address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to construct HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Unreachable {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: Url, status: StatusCode },
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("unrecognised state response from {url}: {detail}")]
    Protocol { url: Url, detail: String },
}

/// Coarse classification used for logging and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Endpoint unreachable or answered with a non-success status.
    Transport,
    /// State body could not be interpreted.
    Protocol,
    /// Local misconfiguration; never produced by a request.
    Setup,
}

impl CompanionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAddress { .. } | Self::Client(_) => ErrorKind::Setup,
            Self::Unreachable { .. } | Self::Status { .. } | Self::Body { .. } => {
                ErrorKind::Transport
            }
            Self::Protocol { .. } => ErrorKind::Protocol,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompanionConfig {
    pub base: Url,
    pub timeout: Duration,
}

impl CompanionConfig {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self, CompanionError> {
        Self::from_base_url(&format!("http://{host}:{port}/"), timeout)
    }

    pub fn from_base_url(base: &str, timeout: Duration) -> Result<Self, CompanionError> {
        let invalid = |reason: String| CompanionError::InvalidAddress {
            address: base.to_string(),
            reason,
        };
        let mut url = Url::parse(base).map_err(|err| invalid(err.to_string()))?;
        if url.scheme() != "http" {
            return Err(invalid(format!(
                "scheme '{}' is not supported; the companion serves plain http",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".into()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self { base: url, timeout })
    }

    pub fn state_url(&self) -> Result<Url, CompanionError> {
        self.join(STATE_PATH)
    }

    pub fn image_url(&self) -> Result<Url, CompanionError> {
        self.join(IMAGE_PATH)
    }

    fn join(&self, path: &str) -> Result<Url, CompanionError> {
        self.base
            .join(path)
            .map_err(|err| CompanionError::InvalidAddress {
                address: self.base.to_string(),
                reason: err.to_string(),
            })
    }
}

/// Blocking client for the companion's state and background endpoints.
///
/// Cloning is cheap and shares the underlying connection pool, so worker
/// threads each hold their own clone.
#[derive(Debug, Clone)]
pub struct CompanionClient {
    http: Client,
    state_url: Url,
    image_url: Url,
}

impl CompanionClient {
    pub fn new(config: CompanionConfig) -> Result<Self, CompanionError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(CompanionError::Client)?;
        Ok(Self {
            http,
            state_url: config.state_url()?,
            image_url: config.image_url()?,
        })
    }

    pub fn state_url(&self) -> &Url {
        &self.state_url
    }

    pub fn image_url(&self) -> &Url {
        &self.image_url
    }

    /// Asks the companion whether a new background is waiting.
    pub fn check_state(&self) -> Result<SyncState, CompanionError> {
        let url = &self.state_url;
        let response = self.get(url)?;
        let body = response.bytes().map_err(|source| CompanionError::Body {
            url: url.clone(),
            source,
        })?;
        let state = SyncState::from_body(&body).map_err(|detail| CompanionError::Protocol {
            url: url.clone(),
            detail,
        })?;
        trace!(%url, %state, "companion state");
        Ok(state)
    }

    /// Downloads the raw background bytes. The format is not declared by the
    /// server and is left for the caller to sniff.
    pub fn fetch_background(&self) -> Result<Vec<u8>, CompanionError> {
        let url = &self.image_url;
        let response = self.get(url)?;
        let bytes = response.bytes().map_err(|source| CompanionError::Body {
            url: url.clone(),
            source,
        })?;
        trace!(%url, len = bytes.len(), "downloaded background");
        Ok(bytes.to_vec())
    }

    fn get(&self, url: &Url) -> Result<Response, CompanionError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|source| CompanionError::Unreachable {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(CompanionError::Status {
                url: url.clone(),
                status,
            });
        }
        Ok(response)
    }
}
