//! Async facade over [`RenderOrchestrator`] for tokio hosts.
//!
//! Render jobs are CPU and memory heavy, so an admission gate bounds how many
//! run at once. Excess requests wait for a permit rather than failing.

use std::sync::Arc;

use tokio::sync::Semaphore;

use texbake_common::config::ServiceConfig;
use texbake_common::error::{TexbakeError, TexbakeResult};
use texbake_job_model::{JobOutcome, RenderRequest};

use crate::orchestrator::RenderOrchestrator;

/// Runs render jobs on the blocking pool behind a concurrency limit.
#[derive(Debug, Clone)]
pub struct RenderService {
    orchestrator: Arc<RenderOrchestrator>,
    gate: Arc<Semaphore>,
}

impl RenderService {
    pub fn new(orchestrator: RenderOrchestrator, max_concurrent: usize) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            gate: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> TexbakeResult<Self> {
        Ok(Self::new(
            RenderOrchestrator::from_config(config)?,
            config.renderer.max_concurrent,
        ))
    }

    /// Permits currently free.
    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }

    /// Render `texture_paths` onto `model_path` and report the outcome.
    pub async fn render(&self, model_path: String, texture_paths: Vec<String>) -> JobOutcome {
        let request = RenderRequest::new(model_path, texture_paths);
        self.submit(move |orchestrator| orchestrator.run_request(&request))
            .await
    }

    /// Resolve named inputs, render, and report the outcome.
    pub async fn render_named(&self, ship_model: String, texture_date: String) -> JobOutcome {
        self.submit(move |orchestrator| orchestrator.run_named(&ship_model, &texture_date))
            .await
    }

    async fn submit<F>(&self, job: F) -> JobOutcome
    where
        F: FnOnce(&RenderOrchestrator) -> TexbakeResult<texbake_job_model::ArtifactReference>
            + Send
            + 'static,
    {
        let _permit = match self.gate.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                return JobOutcome::failed(&TexbakeError::Other(anyhow::anyhow!(
                    "render service is shut down"
                )))
            }
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        match tokio::task::spawn_blocking(move || job(&orchestrator)).await {
            Ok(result) => JobOutcome::from(result),
            Err(join_err) => {
                tracing::error!(error = %join_err, "Render task did not complete");
                JobOutcome::failed(&TexbakeError::Other(anyhow::anyhow!(
                    "render task aborted: {join_err}"
                )))
            }
        }
    }

    /// Stop admitting new jobs. Jobs already holding a permit run to completion.
    pub fn close(&self) {
        self.gate.close();
    }
}
