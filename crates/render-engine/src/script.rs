//! Per-job copies of the render-control script.
//!
//! The template takes no substitutions; all per-job variability reaches the
//! renderer through process arguments. Each job still gets its own copy so
//! that no two renderer processes ever read the same script file.

use std::path::{Path, PathBuf};

use tempfile::TempPath;

use texbake_common::error::{TexbakeError, TexbakeResult};
use texbake_job_model::ExtractedMetadata;

const SCRIPT_PREFIX: &str = "render_script_";
const SCRIPT_SUFFIX: &str = ".py";

/// Creates script instances from a template.
#[derive(Debug, Clone)]
pub struct ScriptProvisioner {
    template: PathBuf,
    scratch_dir: PathBuf,
}

impl ScriptProvisioner {
    pub fn new(template: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Copy the template to a uniquely named file in the scratch directory.
    ///
    /// `meta` is recorded in the log only; the copy is byte-identical to the
    /// template.
    pub fn provision(&self, meta: &ExtractedMetadata) -> TexbakeResult<ScriptInstance> {
        let contents = std::fs::read(&self.template).map_err(|e| {
            TexbakeError::script_provisioning(
                format!("cannot read template {}", self.template.display()),
                e,
            )
        })?;

        let scratch_dir = self.scratch_dir.canonicalize().map_err(|e| {
            TexbakeError::script_provisioning(
                format!("cannot resolve scratch dir {}", self.scratch_dir.display()),
                e,
            )
        })?;
        let mut file = tempfile::Builder::new()
            .prefix(SCRIPT_PREFIX)
            .suffix(SCRIPT_SUFFIX)
            .tempfile_in(&scratch_dir)
            .map_err(|e| {
                TexbakeError::script_provisioning(
                    format!("cannot create script in {}", self.scratch_dir.display()),
                    e,
                )
            })?;

        std::io::Write::write_all(&mut file, &contents)
            .and_then(|_| file.as_file().sync_all())
            .map_err(|e| {
                TexbakeError::script_provisioning(
                    format!("cannot write script {}", file.path().display()),
                    e,
                )
            })?;

        // Close our handle; the renderer opens the file by path.
        let path = file.into_temp_path();
        tracing::debug!(
            script = %path.display(),
            model = %meta.model_name,
            date = %meta.date_token,
            bytes = contents.len(),
            "Provisioned script instance"
        );
        Ok(ScriptInstance { path })
    }
}

/// A job-owned script file, deleted when released or dropped.
#[derive(Debug)]
pub struct ScriptInstance {
    path: TempPath,
}

impl ScriptInstance {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the script now. Failures are logged and swallowed.
    pub fn release(self) {
        let shown = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => tracing::debug!(script = %shown.display(), "Released script instance"),
            Err(e) => tracing::warn!(
                script = %shown.display(),
                error = %e,
                "Failed to delete script instance"
            ),
        }
    }
}
