//! One render job from request to validated artifact.
//!
//! ```text
//! Received ─▶ MetadataExtracted ─▶ ScriptProvisioned ─▶ Executed ─▶ Validated ─▶ Completed
//!     └──────────────┴───────────────────┴──────────────┴────────────┴──▶ Failed
//! ```
//!
//! The script instance and the output reservation are scoped guards, so
//! they are released on every exit path, including early returns via `?`.

use std::path::PathBuf;
use std::sync::Arc;

use texbake_common::clock::{SharedClock, SystemClock};
use texbake_common::config::ServiceConfig;
use texbake_common::error::TexbakeResult;
use texbake_job_model::{
    detect_source_tag, ArtifactReference, ExtractedMetadata, JobId, JobState, RenderRequest,
};

use crate::executor::RenderExecutor;
use crate::inputs::InputResolver;
use crate::output::OutputReservation;
use crate::script::ScriptProvisioner;
use crate::validate::OutputValidator;

/// Composes metadata extraction, script provisioning, execution and
/// validation into one synchronous job.
#[derive(Debug, Clone)]
pub struct RenderOrchestrator {
    provisioner: ScriptProvisioner,
    executor: RenderExecutor,
    validator: OutputValidator,
    resolver: InputResolver,
    output_dir: PathBuf,
    extension: String,
    url_prefix: String,
    clock: SharedClock,
}

impl RenderOrchestrator {
    /// Orchestrator for `config` using the real renderer and the system clock.
    pub fn from_config(config: &ServiceConfig) -> TexbakeResult<Self> {
        Ok(Self {
            provisioner: ScriptProvisioner::new(
                &config.renderer.script_template,
                config.renderer.resolved_scratch_dir(),
            ),
            executor: RenderExecutor::from_config(&config.renderer)?,
            validator: OutputValidator,
            resolver: InputResolver::new(config.inputs.clone()),
            output_dir: config.output.dir.clone(),
            extension: config.output.extension.clone(),
            url_prefix: config.output.url_prefix.clone(),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_executor(mut self, executor: RenderExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Bake `texture_paths` onto `model_path`.
    ///
    /// At least two texture paths are required (top view, side view); fewer
    /// fails before any filesystem or process side effect.
    pub fn run(&self, model_path: &str, texture_paths: &[String]) -> TexbakeResult<ArtifactReference> {
        let request = RenderRequest::new(model_path, texture_paths.to_vec());
        self.run_request(&request)
    }

    /// Resolve a model name and texture date, then run the job.
    pub fn run_named(&self, ship_model: &str, texture_date: &str) -> TexbakeResult<ArtifactReference> {
        let request = self.resolver.resolve_named(ship_model, texture_date)?;
        self.run_request(&request)
    }

    pub fn run_request(&self, request: &RenderRequest) -> TexbakeResult<ArtifactReference> {
        let job_id = JobId::new();
        let mut tracker = StateTracker::new(job_id);

        match self.drive(job_id, request, &mut tracker) {
            Ok(reference) => {
                tracker.advance(JobState::Completed);
                tracing::info!(
                    %job_id,
                    artifact = %reference.artifact_file_name,
                    size_bytes = reference.artifact.size_bytes,
                    "Render job completed"
                );
                Ok(reference)
            }
            Err(err) => {
                tracing::error!(
                    %job_id,
                    failed_in = tracker.state.as_str(),
                    model = %request.model_path,
                    textures = ?request.texture_paths,
                    error = %err,
                    "Render job failed"
                );
                tracker.advance(JobState::Failed);
                Err(err)
            }
        }
    }

    fn drive(
        &self,
        job_id: JobId,
        request: &RenderRequest,
        tracker: &mut StateTracker,
    ) -> TexbakeResult<ArtifactReference> {
        tracing::info!(
            %job_id,
            model = %request.model_path,
            textures = request.texture_paths.len(),
            "Render job received"
        );
        request.validate()?;
        for path in &request.texture_paths {
            if let Some((tag, date)) = detect_source_tag(path) {
                tracing::info!(%job_id, source = %tag, date = %date, path = %path, "Internal-network texture path");
            }
        }

        let meta = ExtractedMetadata::extract(request, self.clock.as_ref())?;
        tracing::info!(
            %job_id,
            model_name = %meta.model_name,
            date_token = %meta.date_token,
            date_source = ?meta.date_source,
            "Metadata extracted"
        );
        tracker.advance(JobState::MetadataExtracted);

        if !self.output_dir.exists() {
            tracing::info!(dir = %self.output_dir.display(), "Creating output directory");
        }
        std::fs::create_dir_all(&self.output_dir)?;
        // The renderer runs in its own working directory, so it only ever
        // sees absolute paths.
        let output_dir = self.output_dir.canonicalize()?;

        let script = self.provisioner.provision(&meta)?;
        let reservation =
            OutputReservation::claim(&output_dir, &meta, &self.extension, self.clock.as_ref())?;
        tracker.advance(JobState::ScriptProvisioned);
        tracing::info!(%job_id, output = %reservation.path().display(), "Output reserved");

        let job = self.executor.prepare(
            job_id,
            script.path(),
            &request.model_path,
            request.top_texture(),
            request.side_texture(),
            reservation.path(),
        );
        let executed = self.executor.execute(&job);
        // The renderer has exited either way; the script is no longer needed.
        script.release();
        executed?;
        tracker.advance(JobState::Executed);

        let artifact = self.validator.validate(reservation.path())?;
        tracker.advance(JobState::Validated);
        reservation.commit();

        Ok(ArtifactReference::new(artifact, &self.url_prefix))
    }
}

struct StateTracker {
    job_id: JobId,
    state: JobState,
}

impl StateTracker {
    fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            state: JobState::Received,
        }
    }

    fn advance(&mut self, to: JobState) {
        debug_assert!(!self.state.is_terminal(), "job already {:?}", self.state);
        debug_assert!(
            to == JobState::Failed || self.state.next() == Some(to),
            "illegal transition {:?} -> {:?}",
            self.state,
            to
        );
        tracing::debug!(job_id = %self.job_id, from = self.state.as_str(), to = to.as_str(), "Job state");
        self.state = to;
    }
}
