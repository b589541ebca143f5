//! Post-exit artifact checks.
//!
//! Renderers are known to exit cleanly after silently failing to write
//! output, so a zero exit status is never taken as proof of an artifact.

use std::path::Path;

use texbake_common::error::{TexbakeError, TexbakeResult};
use texbake_job_model::Artifact;

/// Confirms that a render produced a usable artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputValidator;

impl OutputValidator {
    /// The artifact at `output_path`, if it exists, is a regular file, and
    /// is non-empty.
    pub fn validate(&self, output_path: &Path) -> TexbakeResult<Artifact> {
        let metadata = match std::fs::metadata(output_path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TexbakeError::output_validation(
                    output_path,
                    "renderer did not create the output file",
                ));
            }
            Err(e) => {
                return Err(TexbakeError::output_validation(
                    output_path,
                    format!("cannot stat output file: {e}"),
                ));
            }
        };

        if !metadata.is_file() {
            return Err(TexbakeError::output_validation(
                output_path,
                "output path is not a regular file",
            ));
        }
        if metadata.len() == 0 {
            return Err(TexbakeError::output_validation(
                output_path,
                "output file is empty",
            ));
        }

        let file_name = output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| TexbakeError::output_validation(output_path, "output has no file name"))?;
        let absolute_path = output_path
            .canonicalize()
            .unwrap_or_else(|_| output_path.to_path_buf());

        tracing::info!(
            path = %absolute_path.display(),
            size_bytes = metadata.len(),
            "Artifact validated"
        );

        Ok(Artifact {
            file_name,
            absolute_path,
            size_bytes: metadata.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_file_is_an_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hull_20241216_20250522_204702.glb");
        std::fs::write(&path, b"glTF").unwrap();

        let artifact = OutputValidator.validate(&path).unwrap();
        assert_eq!(artifact.file_name, "hull_20241216_20250522_204702.glb");
        assert_eq!(artifact.size_bytes, 4);
        assert!(artifact.absolute_path.is_absolute());
    }

    #[test]
    fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = OutputValidator
            .validate(&dir.path().join("absent.glb"))
            .unwrap_err();
        assert_eq!(err.kind(), "output_validation");
        assert!(err.to_string().contains("did not create"));
    }

    #[test]
    fn empty_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.glb");
        std::fs::write(&path, b"").unwrap();
        let err = OutputValidator.validate(&path).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = OutputValidator.validate(dir.path()).unwrap_err();
        assert_eq!(err.kind(), "output_validation");
    }
}
