//! Artifact naming convention.
//!
//! `<modelName>_<dateToken>_<YYYYMMDD_HHMMSS>.<extension>`, where the
//! timestamp is the job's own wall-clock time at name generation.

use once_cell::sync::Lazy;
use regex::Regex;

use texbake_common::clock::Clock;

use crate::metadata::ExtractedMetadata;

/// Default artifact extension.
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "glb";

static ARTIFACT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<model>.+)_(?P<date>\d{8})_(?P<ts>\d{8}_\d{6})\.(?P<ext>[A-Za-z0-9]+)$")
        .expect("valid artifact name regex")
});

/// Build an artifact file name from metadata and the clock.
pub fn artifact_file_name(meta: &ExtractedMetadata, extension: &str, clock: &dyn Clock) -> String {
    format!(
        "{}_{}_{}.{}",
        meta.model_name,
        meta.date_token,
        clock.timestamp(),
        extension
    )
}

/// Components of a parsed artifact name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNameParts {
    pub model_name: String,
    pub date_token: String,
    pub timestamp: String,
    pub extension: String,
}

/// Parse a file name produced by [`artifact_file_name`].
pub fn parse_artifact_file_name(name: &str) -> Option<ArtifactNameParts> {
    let caps = ARTIFACT_NAME.captures(name)?;
    Some(ArtifactNameParts {
        model_name: caps.name("model")?.as_str().to_string(),
        date_token: caps.name("date")?.as_str().to_string(),
        timestamp: caps.name("ts")?.as_str().to_string(),
        extension: caps.name("ext")?.as_str().to_string(),
    })
}
