//! Async facade over [`RemoteFileFetcher`] with a bound on open sessions.

use std::sync::Arc;

use tokio::sync::Semaphore;

use texbake_common::config::RemoteConfig;
use texbake_common::error::{TexbakeError, TexbakeResult};

use crate::fetcher::{FetchedFile, RemoteFileFetcher};

/// Result of a fetch as seen by a routing layer.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(FetchedFile),
    /// The caller asked for something it may not have (4xx).
    Rejected(TexbakeError),
    /// The fetch itself failed (5xx).
    Failed(TexbakeError),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }

    pub fn error(&self) -> Option<&TexbakeError> {
        match self {
            Self::Fetched(_) => None,
            Self::Rejected(e) | Self::Failed(e) => Some(e),
        }
    }
}

impl From<TexbakeResult<FetchedFile>> for FetchOutcome {
    fn from(result: TexbakeResult<FetchedFile>) -> Self {
        match result {
            Ok(file) => Self::Fetched(file),
            Err(e) if e.is_client_error() => Self::Rejected(e),
            Err(e) => Self::Failed(e),
        }
    }
}

/// Runs fetches on the blocking pool, at most `max_concurrent` at a time.
#[derive(Debug, Clone)]
pub struct FetchService {
    fetcher: Arc<RemoteFileFetcher>,
    gate: Arc<Semaphore>,
}

impl FetchService {
    pub fn new(fetcher: RemoteFileFetcher, max_concurrent: usize) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            gate: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn from_config(config: &RemoteConfig) -> TexbakeResult<Self> {
        Ok(Self::new(
            RemoteFileFetcher::from_config(config)?,
            config.max_concurrent,
        ))
    }

    pub async fn fetch(&self, remote_path: String) -> FetchOutcome {
        // Reject before queueing for a session slot.
        if let Err(e) = self.fetcher.prefix().check(&remote_path) {
            return FetchOutcome::Rejected(e);
        }

        let Ok(_permit) = self.gate.clone().acquire_owned().await else {
            return FetchOutcome::Failed(TexbakeError::Other(anyhow::anyhow!(
                "fetch service is shut down"
            )));
        };

        let fetcher = Arc::clone(&self.fetcher);
        match tokio::task::spawn_blocking(move || fetcher.fetch(&remote_path)).await {
            Ok(result) => FetchOutcome::from(result),
            Err(join_err) => {
                tracing::error!(error = %join_err, "Fetch task did not complete");
                FetchOutcome::Failed(TexbakeError::Other(anyhow::anyhow!(
                    "fetch task aborted: {join_err}"
                )))
            }
        }
    }

    pub fn close(&self) {
        self.gate.close();
    }
}
