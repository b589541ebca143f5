//! Service configuration.
//!
//! Built once at startup and handed to each component by reference. Secrets
//! (remote password, key path) are never written back to disk and are
//! expected to arrive through the environment rather than the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TexbakeError, TexbakeResult};

/// Global service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// External renderer settings.
    pub renderer: RendererConfig,

    /// Where named inputs live.
    pub inputs: InputConfig,

    /// Where artifacts are written and how they are addressed.
    pub output: OutputConfig,

    /// Remote filesystem access for texture previews.
    pub remote: RemoteConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// External renderer process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Renderer executable (e.g. the Blender binary).
    pub executable: PathBuf,

    /// Render-control script template; copied per job.
    pub script_template: PathBuf,

    /// Working directory for the renderer. Defaults to the service's own.
    pub working_dir: Option<PathBuf>,

    /// Directory for per-job script copies. Defaults to the OS temp dir.
    pub scratch_dir: Option<PathBuf>,

    /// Kill the renderer after this many seconds. `None` waits forever.
    pub timeout_secs: Option<u64>,

    /// Maximum renderer processes running at once.
    pub max_concurrent: usize,
}

/// Locations of named model and texture inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory holding white models (`<name>.<model_extension>`).
    pub models_dir: PathBuf,

    /// Directory holding per-date texture folders.
    pub textures_dir: PathBuf,

    /// Externally reachable base URL. When set, the renderer receives URLs
    /// instead of local paths.
    pub base_url: Option<String>,

    /// Model file extension, without the dot.
    pub model_extension: String,

    /// File name of the top-view texture inside a date folder.
    pub top_texture: String,

    /// File name of the side-view texture inside a date folder.
    pub side_texture: String,
}

/// Artifact output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Shared output directory.
    pub dir: PathBuf,

    /// Artifact extension, without the dot.
    pub extension: String,

    /// URL prefix under which the output directory is served.
    pub url_prefix: String,
}

/// Remote (SFTP) access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub host: String,
    pub port: u16,
    pub username: String,

    /// Password. Resolved from `TEXBAKE_REMOTE_PASSWORD`; never serialized.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Private key file, used instead of the password when set.
    pub private_key: Option<PathBuf>,

    /// Only remote paths under this prefix may be fetched.
    pub mount_prefix: String,

    /// Connect and I/O timeout for a remote session.
    pub timeout_secs: u64,

    /// Maximum remote sessions open at once.
    pub max_concurrent: usize,

    /// Local directory for downloads. Defaults to the OS temp dir.
    pub cache_dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "texbake=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("blender"),
            script_template: PathBuf::from("scripts/texture_mapping.py"),
            working_dir: None,
            scratch_dir: None,
            timeout_secs: Some(600),
            max_concurrent: 2,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("data/models"),
            textures_dir: PathBuf::from("data/textures"),
            base_url: None,
            model_extension: "ply".to_string(),
            top_texture: "top.jpg".to_string(),
            side_texture: "side.jpg".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output/models"),
            extension: "glb".to_string(),
            url_prefix: "/models".to_string(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 22,
            username: String::new(),
            password: None,
            private_key: None,
            mount_prefix: "/mnt/".to_string(),
            timeout_secs: 30,
            max_concurrent: 4,
            cache_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl RendererConfig {
    /// Effective renderer working directory.
    pub fn resolved_working_dir(&self) -> TexbakeResult<PathBuf> {
        match &self.working_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Effective scratch directory for script instances.
    pub fn resolved_scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl RemoteConfig {
    /// Effective local download directory.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl ServiceConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit file. Unlike [`ServiceConfig::load`],
    /// a missing or malformed file is an error.
    pub fn load_from(path: &Path) -> TexbakeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TexbakeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = serde_json::from_str(&content).map_err(|e| {
            TexbakeError::config(format!("cannot parse {}: {e}", path.display()))
        })?;
        Ok(config)
    }

    /// Overlay values from `TEXBAKE_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> TexbakeResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> TexbakeResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TEXBAKE_RENDERER") {
            self.renderer.executable = PathBuf::from(v);
        }
        if let Some(v) = lookup("TEXBAKE_SCRIPT_TEMPLATE") {
            self.renderer.script_template = PathBuf::from(v);
        }
        if let Some(v) = lookup("TEXBAKE_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("TEXBAKE_BASE_URL") {
            self.inputs.base_url = if v.trim().is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("TEXBAKE_REMOTE_HOST") {
            self.remote.host = v;
        }
        if let Some(v) = lookup("TEXBAKE_REMOTE_PORT") {
            self.remote.port = v
                .parse()
                .map_err(|_| TexbakeError::config(format!("invalid TEXBAKE_REMOTE_PORT: {v}")))?;
        }
        if let Some(v) = lookup("TEXBAKE_REMOTE_USER") {
            self.remote.username = v;
        }
        if let Some(v) = lookup("TEXBAKE_REMOTE_PASSWORD") {
            self.remote.password = Some(v);
        }
        if let Some(v) = lookup("TEXBAKE_REMOTE_KEY") {
            self.remote.private_key = Some(PathBuf::from(v));
        }
        Ok(())
    }

    /// Check settings that would otherwise only fail mid-job.
    pub fn validate(&self) -> TexbakeResult<()> {
        if self.renderer.max_concurrent == 0 {
            return Err(TexbakeError::config("renderer.max_concurrent must be at least 1"));
        }
        if self.remote.max_concurrent == 0 {
            return Err(TexbakeError::config("remote.max_concurrent must be at least 1"));
        }
        if self.output.extension.is_empty() || self.output.extension.contains('.') {
            return Err(TexbakeError::config(format!(
                "output.extension must be a bare extension, got {:?}",
                self.output.extension
            )));
        }
        if !self.remote.mount_prefix.starts_with('/') {
            return Err(TexbakeError::config(format!(
                "remote.mount_prefix must be absolute, got {:?}",
                self.remote.mount_prefix
            )));
        }
        Ok(())
    }

    /// Save config to the standard location. The password is omitted.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("texbake").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = ServiceConfig::default();
        config.validate().unwrap();
        assert_eq!(config.output.extension, "glb");
        assert_eq!(config.remote.mount_prefix, "/mnt/");
    }

    #[test]
    fn password_is_never_serialized() {
        let mut config = ServiceConfig::default();
        config.remote.password = Some("hunter2".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"output":{"dir":"/srv/models"}}"#).unwrap();

        let config = ServiceConfig::load_from(&path).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("/srv/models"));
        assert_eq!(config.output.url_prefix, "/models");
        assert_eq!(config.renderer.max_concurrent, 2);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = ServiceConfig::load_from(&path).unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn env_overrides_resolve_secrets() {
        let env: HashMap<&str, &str> = [
            ("TEXBAKE_REMOTE_HOST", "10.0.0.5"),
            ("TEXBAKE_REMOTE_PORT", "2222"),
            ("TEXBAKE_REMOTE_USER", "viewer"),
            ("TEXBAKE_REMOTE_PASSWORD", "s3cret"),
            ("TEXBAKE_BASE_URL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = ServiceConfig::default();
        config.inputs.base_url = Some("http://old".to_string());
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.remote.host, "10.0.0.5");
        assert_eq!(config.remote.port, 2222);
        assert_eq!(config.remote.username, "viewer");
        assert_eq!(config.remote.password.as_deref(), Some("s3cret"));
        assert!(config.inputs.base_url.is_none());
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_overrides(|k| (k == "TEXBAKE_REMOTE_PORT").then(|| "ssh".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("TEXBAKE_REMOTE_PORT"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = ServiceConfig::default();
        config.renderer.max_concurrent = 0;
        assert!(config.validate().is_err());
    }
}
