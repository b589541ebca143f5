//! Render requests as received from a caller.

use serde::{Deserialize, Serialize};

use texbake_common::error::{TexbakeError, TexbakeResult};

/// Minimum number of texture paths: top view and side view.
pub const MIN_TEXTURES: usize = 2;

/// A request to bake textures onto a model.
///
/// Paths may be local paths, URLs, or remote-mount paths; they are passed to
/// the renderer as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Model file path or URL.
    pub model_path: String,

    /// Ordered texture paths. Index 0 is the top view, index 1 the side view.
    pub texture_paths: Vec<String>,
}

impl RenderRequest {
    pub fn new(model_path: impl Into<String>, texture_paths: Vec<String>) -> Self {
        Self {
            model_path: model_path.into(),
            texture_paths,
        }
    }

    /// Reject requests the pipeline cannot run. Performs no I/O.
    pub fn validate(&self) -> TexbakeResult<()> {
        if self.model_path.trim().is_empty() {
            return Err(TexbakeError::invalid_request("model path is empty"));
        }
        if self.texture_paths.len() < MIN_TEXTURES {
            return Err(TexbakeError::invalid_request(format!(
                "at least {MIN_TEXTURES} texture paths are required (top view and side view), got {}",
                self.texture_paths.len()
            )));
        }
        if let Some(idx) = self
            .texture_paths
            .iter()
            .take(MIN_TEXTURES)
            .position(|p| p.trim().is_empty())
        {
            return Err(TexbakeError::invalid_request(format!(
                "texture path {idx} is empty"
            )));
        }
        Ok(())
    }

    /// Top-view texture. Only meaningful after [`RenderRequest::validate`].
    pub fn top_texture(&self) -> &str {
        &self.texture_paths[0]
    }

    /// Side-view texture. Only meaningful after [`RenderRequest::validate`].
    pub fn side_texture(&self) -> &str {
        &self.texture_paths[1]
    }
}
