//! Remote session abstraction.
//!
//! [`SessionConnector`] is the seam between the fetcher and the transport:
//! production uses SFTP, tests count how often a session is opened.

use std::io::Write;
use std::path::Path;

use texbake_common::error::TexbakeResult;

/// An authenticated session to the remote host.
pub trait RemoteSession: Send {
    /// Stream the file at `remote_path` into `sink`. Returns bytes copied.
    fn download(&mut self, remote_path: &Path, sink: &mut dyn Write) -> TexbakeResult<u64>;

    /// Tear the session down.
    fn close(&mut self) -> TexbakeResult<()>;
}

/// Opens a fresh session per call. No pooling.
pub trait SessionConnector: Send + Sync {
    fn open(&self) -> TexbakeResult<Box<dyn RemoteSession>>;
}

/// Closes the wrapped session when dropped, unless already closed.
pub struct SessionGuard {
    session: Box<dyn RemoteSession>,
    closed: bool,
}

impl SessionGuard {
    pub fn new(session: Box<dyn RemoteSession>) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    pub fn session(&mut self) -> &mut dyn RemoteSession {
        self.session.as_mut()
    }

    /// Close now. A failed close is logged; the transfer already finished.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.session.close() {
            tracing::warn!(error = %e, "Failed to close remote session");
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.shutdown();
    }
}
