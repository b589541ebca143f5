//! Structured job outcomes.
//!
//! A job either succeeds with a model URL or fails with a message; there is
//! no partial success. This is the shape a routing layer serializes.

use serde::{Deserialize, Serialize};

use texbake_common::error::TexbakeError;

use crate::artifact::ArtifactReference;

/// Result of a render job as reported to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl JobOutcome {
    pub fn completed(reference: &ArtifactReference) -> Self {
        Self {
            success: true,
            message: "Texture mapping complete".to_string(),
            model_url: Some(reference.model_url.clone()),
            error_kind: None,
        }
    }

    pub fn failed(err: &TexbakeError) -> Self {
        Self {
            success: false,
            message: format!("Texture mapping failed: {err}"),
            model_url: None,
            error_kind: Some(err.kind().to_string()),
        }
    }
}

impl From<Result<ArtifactReference, TexbakeError>> for JobOutcome {
    fn from(result: Result<ArtifactReference, TexbakeError>) -> Self {
        match result {
            Ok(reference) => Self::completed(&reference),
            Err(err) => Self::failed(&err),
        }
    }
}
