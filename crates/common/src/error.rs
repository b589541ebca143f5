//! Error types shared across texbake crates.

use std::path::PathBuf;

/// Top-level error type for texbake operations.
///
/// Every variant is terminal for the job that raised it; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum TexbakeError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Malformed path: {path} ({reason})")]
    MalformedPath { path: String, reason: String },

    #[error("Script provisioning failed: {message}")]
    ScriptProvisioning {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Renderer exited with failure status {}", display_code(.code))]
    RenderExecution { code: Option<i32> },

    #[error("Renderer exceeded the {limit_secs}s time limit and was killed")]
    RenderTimeout { limit_secs: u64 },

    #[error("Output validation failed for {path}: {reason}")]
    OutputValidation { path: PathBuf, reason: String },

    #[error("Remote fetch failed: {message}")]
    RemoteFetch { message: String },

    #[error("Access denied: {path} is outside the allowed mount prefix")]
    AccessDenied { path: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using TexbakeError.
pub type TexbakeResult<T> = Result<T, TexbakeError>;

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "<terminated by signal>".to_string(),
    }
}

impl TexbakeError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: msg.into(),
        }
    }

    pub fn malformed_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn script_provisioning(msg: impl Into<String>, source: std::io::Error) -> Self {
        Self::ScriptProvisioning {
            message: msg.into(),
            source: Some(source),
        }
    }

    pub fn output_validation(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::OutputValidation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn remote_fetch(msg: impl Into<String>) -> Self {
        Self::RemoteFetch {
            message: msg.into(),
        }
    }

    pub fn access_denied(path: impl Into<String>) -> Self {
        Self::AccessDenied { path: path.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Stable machine-readable kind, used in structured job outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::MalformedPath { .. } => "malformed_path",
            Self::ScriptProvisioning { .. } => "script_provisioning",
            Self::RenderExecution { .. } => "render_execution",
            Self::RenderTimeout { .. } => "render_timeout",
            Self::OutputValidation { .. } => "output_validation",
            Self::RemoteFetch { .. } => "remote_fetch",
            Self::AccessDenied { .. } => "access_denied",
            Self::Config { .. } => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Other(_) => "other",
        }
    }

    /// Whether the caller is at fault (bad input) rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. } | Self::MalformedPath { .. } | Self::AccessDenied { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_execution_message_includes_code() {
        let err = TexbakeError::RenderExecution { code: Some(3) };
        assert_eq!(err.to_string(), "Renderer exited with failure status 3");

        let killed = TexbakeError::RenderExecution { code: None };
        assert!(killed.to_string().contains("signal"));
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(TexbakeError::invalid_request("x").kind(), "invalid_request");
        assert_eq!(TexbakeError::access_denied("/etc").kind(), "access_denied");
        assert_eq!(
            TexbakeError::output_validation("/tmp/a.glb", "empty").kind(),
            "output_validation"
        );
    }

    #[test]
    fn client_errors_are_classified() {
        assert!(TexbakeError::access_denied("/etc/passwd").is_client_error());
        assert!(TexbakeError::malformed_path("abc", "no extension").is_client_error());
        assert!(!TexbakeError::remote_fetch("timeout").is_client_error());
    }
}
