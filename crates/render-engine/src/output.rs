//! Claiming artifact names in the shared output directory.
//!
//! Names carry second resolution, so two identical requests within the same
//! second would collide. A name is claimed by creating the file with
//! create-new semantics; on collision the next second is tried.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use texbake_common::clock::{Clock, OffsetClock};
use texbake_common::error::{TexbakeError, TexbakeResult};
use texbake_job_model::{artifact_file_name, ExtractedMetadata};

/// How many consecutive seconds to try before giving up.
const MAX_NAME_ATTEMPTS: i64 = 5;

/// A claimed output path. The file is removed on drop unless committed.
#[derive(Debug)]
pub struct OutputReservation {
    path: PathBuf,
    file_name: String,
    committed: bool,
}

impl OutputReservation {
    /// Claim an artifact name for `meta` inside `dir`.
    pub fn claim(
        dir: &Path,
        meta: &ExtractedMetadata,
        extension: &str,
        clock: &dyn Clock,
    ) -> TexbakeResult<Self> {
        for offset in 0..MAX_NAME_ATTEMPTS {
            let shifted = OffsetClock::new(clock, offset);
            let file_name = artifact_file_name(meta, extension, &shifted);
            let path = dir.join(&file_name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    if offset > 0 {
                        tracing::debug!(file = %file_name, offset, "Artifact name collided; shifted");
                    }
                    return Ok(Self {
                        path,
                        file_name,
                        committed: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(TexbakeError::Io(e)),
            }
        }
        Err(TexbakeError::Other(anyhow::anyhow!(
            "no free artifact name for {} after {MAX_NAME_ATTEMPTS} attempts",
            meta.model_name
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Keep the file: it is now a validated artifact.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for OutputReservation {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed unused output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove unused output"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texbake_common::clock::FixedClock;
    use texbake_job_model::DateSource;

    fn meta() -> ExtractedMetadata {
        ExtractedMetadata {
            model_name: "hull".to_string(),
            date_token: "20241216".to_string(),
            date_source: DateSource::Path,
            source_tag: None,
        }
    }

    #[test]
    fn same_second_requests_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let clock = FixedClock::at(2025, 5, 22, 20, 47, 2).unwrap();

        let first = OutputReservation::claim(dir.path(), &meta(), "glb", &clock).unwrap();
        let second = OutputReservation::claim(dir.path(), &meta(), "glb", &clock).unwrap();
        assert_eq!(first.file_name(), "hull_20241216_20250522_204702.glb");
        assert_eq!(second.file_name(), "hull_20241216_20250522_204703.glb");
    }

    #[test]
    fn uncommitted_reservation_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let clock = FixedClock::at(2025, 5, 22, 20, 47, 2).unwrap();
        let path = {
            let r = OutputReservation::claim(dir.path(), &meta(), "glb", &clock).unwrap();
            assert!(r.path().exists());
            r.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn committed_reservation_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let clock = FixedClock::at(2025, 5, 22, 20, 47, 2).unwrap();
        let r = OutputReservation::claim(dir.path(), &meta(), "glb", &clock).unwrap();
        let path = r.path().to_path_buf();
        r.commit();
        assert!(path.exists());
    }

    #[test]
    fn gives_up_after_bounded_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let clock = FixedClock::at(2025, 5, 22, 20, 47, 2).unwrap();
        let held: Vec<_> = (0..MAX_NAME_ATTEMPTS)
            .map(|_| OutputReservation::claim(dir.path(), &meta(), "glb", &clock).unwrap())
            .collect();
        assert_eq!(held.len() as i64, MAX_NAME_ATTEMPTS);
        assert!(OutputReservation::claim(dir.path(), &meta(), "glb", &clock).is_err());
    }
}
