//! Render jobs and the artifacts they produce.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier used to correlate log lines of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Lifecycle of a render job. Linear; `Failed` is reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Received,
    MetadataExtracted,
    ScriptProvisioned,
    Executed,
    Validated,
    Completed,
    Failed,
}

impl JobState {
    /// The state a successful step leads to.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Received => Some(Self::MetadataExtracted),
            Self::MetadataExtracted => Some(Self::ScriptProvisioned),
            Self::ScriptProvisioned => Some(Self::Executed),
            Self::Executed => Some(Self::Validated),
            Self::Validated => Some(Self::Completed),
            Self::Completed | Self::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::MetadataExtracted => "metadata_extracted",
            Self::ScriptProvisioned => "script_provisioned",
            Self::Executed => "executed",
            Self::Validated => "validated",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Everything needed to launch one renderer process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub job_id: JobId,

    /// Private script copy owned by this job.
    pub script_instance_path: PathBuf,

    /// Where the renderer must write the artifact.
    pub output_path: PathBuf,

    /// Full argument vector, executable first.
    pub argument_vector: Vec<String>,
}

/// A validated output file: it exists and is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub file_name: String,
    pub absolute_path: PathBuf,
    pub size_bytes: u64,
}

/// What a caller receives for a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReference {
    pub artifact_file_name: String,

    /// URL path under which the output directory is served.
    pub model_url: String,

    pub artifact: Artifact,
}

impl ArtifactReference {
    pub fn new(artifact: Artifact, url_prefix: &str) -> Self {
        let model_url = format!(
            "{}/{}",
            url_prefix.trim_end_matches('/'),
            artifact.file_name
        );
        Self {
            artifact_file_name: artifact.file_name.clone(),
            model_url,
            artifact,
        }
    }
}

/// A file fetched from the remote mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileHandle {
    pub remote_path: String,
    pub local_cache_path: PathBuf,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_is_linear() {
        let mut state = JobState::Received;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            state = next;
            visited.push(state);
        }
        assert_eq!(state, JobState::Completed);
        assert_eq!(visited.len(), 6);
        assert!(state.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(visited[..5].iter().all(|s| !s.is_terminal()));
        assert!(!visited.contains(&JobState::Failed));
        assert!(JobState::Failed.next().is_none());
    }

    #[test]
    fn model_url_joins_prefix() {
        let artifact = Artifact {
            file_name: "a_20250522_20250522_204702.glb".to_string(),
            absolute_path: PathBuf::from("/srv/out/a_20250522_20250522_204702.glb"),
            size_bytes: 10,
        };
        let reference = ArtifactReference::new(artifact.clone(), "/models/");
        assert_eq!(reference.model_url, "/models/a_20250522_20250522_204702.glb");
        assert_eq!(reference.artifact_file_name, artifact.file_name);
    }

    #[test]
    fn job_ids_are_unique() {
        assert_ne!(JobId::new(), JobId::new());
        assert_eq!(JobId::new().to_string().len(), 32);
    }
}
