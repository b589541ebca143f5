//! Single-file fetches from the remote mount.

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use texbake_common::config::RemoteConfig;
use texbake_common::error::{TexbakeError, TexbakeResult};
use texbake_job_model::RemoteFileHandle;

use crate::allow_list::MountPrefix;
use crate::content_type::content_type_for;
use crate::session::{SessionConnector, SessionGuard};
use crate::sftp::SftpConnector;

/// `Cache-Control` value for serving fetched images.
pub const CACHE_CONTROL: &str = "public, max-age=3600";

const DOWNLOAD_PREFIX: &str = "remote_";

/// A fetched file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub handle: RemoteFileHandle,
    pub bytes: Vec<u8>,
}

/// Downloads allow-listed remote files, one fresh session per call.
#[derive(Clone)]
pub struct RemoteFileFetcher {
    prefix: MountPrefix,
    connector: Arc<dyn SessionConnector>,
    cache_dir: PathBuf,
}

impl std::fmt::Debug for RemoteFileFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFileFetcher")
            .field("prefix", &self.prefix)
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl RemoteFileFetcher {
    pub fn new(
        prefix: MountPrefix,
        connector: Arc<dyn SessionConnector>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            prefix,
            connector,
            cache_dir: cache_dir.into(),
        }
    }

    /// Fetcher for `config` over SFTP.
    pub fn from_config(config: &RemoteConfig) -> TexbakeResult<Self> {
        Ok(Self::new(
            MountPrefix::new(&config.mount_prefix)?,
            Arc::new(SftpConnector::from_config(config)),
            config.resolved_cache_dir(),
        ))
    }

    pub fn with_connector(mut self, connector: Arc<dyn SessionConnector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn prefix(&self) -> &MountPrefix {
        &self.prefix
    }

    /// Fetch `remote_path` into memory.
    ///
    /// Paths outside the mount prefix fail with
    /// [`TexbakeError::AccessDenied`] before any connection is attempted.
    pub fn fetch(&self, remote_path: &str) -> TexbakeResult<FetchedFile> {
        if let Err(err) = self.prefix.check(remote_path) {
            tracing::warn!(path = %remote_path, prefix = %self.prefix.as_str(), "Remote path rejected");
            return Err(err);
        }

        let started = Instant::now();
        let content_type = content_type_for(remote_path);
        let mut download = tempfile::Builder::new()
            .prefix(DOWNLOAD_PREFIX)
            .suffix(&download_suffix(remote_path))
            .tempfile_in(&self.cache_dir)
            .map_err(|e| {
                TexbakeError::remote_fetch(format!(
                    "cannot create download file in {}: {e}",
                    self.cache_dir.display()
                ))
            })?;

        let mut guard = SessionGuard::new(self.connector.open()?);
        let copied = guard
            .session()
            .download(Path::new(remote_path), download.as_file_mut());
        guard.close();
        let copied = copied?;

        let mut bytes = Vec::with_capacity(usize::try_from(copied).unwrap_or(0));
        let file = download.as_file_mut();
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.read_to_end(&mut bytes))
            .map_err(|e| TexbakeError::remote_fetch(format!("cannot read back download: {e}")))?;

        let handle = RemoteFileHandle {
            remote_path: remote_path.to_string(),
            local_cache_path: download.path().to_path_buf(),
            content_type: content_type.to_string(),
        };
        tracing::info!(
            path = %remote_path,
            size_bytes = bytes.len(),
            content_type,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Remote file fetched"
        );

        // `download` drops here and removes the local copy.
        Ok(FetchedFile { handle, bytes })
    }
}

fn download_suffix(remote_path: &str) -> String {
    Path::new(remote_path)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
