//! Renderer supervision.
//!
//! The renderer contract is positional and fixed:
//!
//! ```text
//! <executable> --background --python <script> -- <model> <texture0> <texture1> <output>
//! ```
//!
//! The renderer is expected to write the artifact to exactly `<output>`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use texbake_common::config::RendererConfig;
use texbake_common::error::{TexbakeError, TexbakeResult};
use texbake_job_model::{JobId, RenderJob};

use crate::launcher::{ExitReport, OutputStream, ProcessLauncher, RenderCommand, SystemLauncher};

/// Build the renderer argument vector, executable first.
pub fn build_argument_vector(
    executable: &Path,
    script: &Path,
    model: &str,
    top_texture: &str,
    side_texture: &str,
    output: &Path,
) -> Vec<String> {
    vec![
        executable.to_string_lossy().into_owned(),
        "--background".to_string(),
        "--python".to_string(),
        script.to_string_lossy().into_owned(),
        "--".to_string(),
        model.to_string(),
        top_texture.to_string(),
        side_texture.to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Resolve `executable` the way process spawning will: paths with a
/// separator are taken as-is, bare names are searched on `PATH`.
pub fn locate_executable(executable: &Path) -> Option<PathBuf> {
    if executable.components().count() > 1 {
        return executable.is_file().then(|| executable.to_path_buf());
    }
    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(executable))
        .find(|candidate| candidate.is_file())
}

/// Spawns the renderer for a job and waits for it to finish.
#[derive(Clone)]
pub struct RenderExecutor {
    executable: PathBuf,
    working_dir: PathBuf,
    timeout: Option<Duration>,
    launcher: Arc<dyn ProcessLauncher>,
}

impl std::fmt::Debug for RenderExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderExecutor")
            .field("executable", &self.executable)
            .field("working_dir", &self.working_dir)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RenderExecutor {
    pub fn new(
        executable: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> Self {
        Self {
            executable: executable.into(),
            working_dir: working_dir.into(),
            timeout: None,
            launcher,
        }
    }

    /// Executor for the configured renderer using real processes.
    pub fn from_config(config: &RendererConfig) -> TexbakeResult<Self> {
        Ok(Self::new(
            &config.executable,
            config.resolved_working_dir()?,
            Arc::new(SystemLauncher),
        )
        .with_timeout(config.timeout_secs.map(Duration::from_secs)))
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Assemble a [`RenderJob`] for the given inputs.
    pub fn prepare(
        &self,
        job_id: JobId,
        script: &Path,
        model: &str,
        top_texture: &str,
        side_texture: &str,
        output: &Path,
    ) -> RenderJob {
        RenderJob {
            job_id,
            script_instance_path: script.to_path_buf(),
            output_path: output.to_path_buf(),
            argument_vector: build_argument_vector(
                &self.executable,
                script,
                model,
                top_texture,
                side_texture,
                output,
            ),
        }
    }

    /// Run the renderer to completion.
    ///
    /// Each output line is logged under the `renderer` target. A non-zero or
    /// signal exit is [`TexbakeError::RenderExecution`]; it is not retried.
    pub fn execute(&self, job: &RenderJob) -> TexbakeResult<ExitReport> {
        let (program, args) = job
            .argument_vector
            .split_first()
            .ok_or_else(|| TexbakeError::invalid_request("empty renderer argument vector"))?;

        let command = RenderCommand {
            program: PathBuf::from(program),
            args: args.to_vec(),
            working_dir: self.working_dir.clone(),
            merge_stderr: true,
            timeout: self.timeout,
        };

        tracing::info!(job_id = %job.job_id, command = ?command.argv(), "Executing renderer");

        let job_id = job.job_id;
        let report = self.launcher.launch(&command, &mut |stream, line| match stream {
            OutputStream::Stdout => tracing::info!(target: "renderer", %job_id, "{line}"),
            OutputStream::Stderr => tracing::info!(target: "renderer", %job_id, stderr = true, "{line}"),
        })?;

        tracing::info!(
            job_id = %job.job_id,
            code = ?report.code,
            lines = report.output_lines,
            elapsed_secs = report.elapsed.as_secs_f64(),
            "Renderer exited"
        );

        if !report.success {
            return Err(TexbakeError::RenderExecution { code: report.code });
        }
        Ok(report)
    }
}
