//! The remote mount allow-list.
//!
//! Remote paths arrive straight from callers. Only paths that name a file
//! strictly below the mount prefix, with no relative segments, are ever
//! sent to the remote host.

use texbake_common::error::{TexbakeError, TexbakeResult};

/// Default allow-listed mount root.
pub const DEFAULT_MOUNT_PREFIX: &str = "/mnt/";

/// An absolute directory prefix that remote paths must lie under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPrefix {
    /// Always absolute and `/`-terminated.
    prefix: String,
}

impl MountPrefix {
    pub fn new(prefix: &str) -> TexbakeResult<Self> {
        if !prefix.starts_with('/') || prefix.contains('\0') {
            return Err(TexbakeError::config(format!(
                "mount prefix must be an absolute path, got {prefix:?}"
            )));
        }
        let trimmed = prefix.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(TexbakeError::config("mount prefix must not be the filesystem root"));
        }
        if trimmed[1..].split('/').any(|s| s.is_empty() || s == "." || s == "..") {
            return Err(TexbakeError::config(format!(
                "mount prefix must be a normalized path, got {prefix:?}"
            )));
        }
        Ok(Self {
            prefix: format!("{trimmed}/"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Accept `remote_path` or fail with [`TexbakeError::AccessDenied`].
    pub fn check(&self, remote_path: &str) -> TexbakeResult<()> {
        let denied = || TexbakeError::access_denied(remote_path);

        if remote_path.contains(['\0', '\\']) {
            return Err(denied());
        }
        let rest = remote_path.strip_prefix(&self.prefix).ok_or_else(denied)?;
        if rest.is_empty() || rest.ends_with('/') {
            return Err(denied());
        }
        if rest.split('/').any(|s| s.is_empty() || s == "." || s == "..") {
            return Err(denied());
        }
        Ok(())
    }
}

impl Default for MountPrefix {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_MOUNT_PREFIX.to_string(),
        }
    }
}
